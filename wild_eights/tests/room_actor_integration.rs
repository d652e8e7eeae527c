//! Integration tests for the room actor layer: join/attach flows, grace
//! timers, host migration broadcasts, and idle eviction.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use wild_eights::entities::{ConnectionState, GameKind, Nickname, RoomStatus};
use wild_eights::game::{GameError, GameSettings};
use wild_eights::net::events::{HandView, ServerEvent};
use wild_eights::room::{PlayerCommand, RoomConfig, RoomRegistry};
use wild_eights::store::repository::{MemoryRoomStore, RoomStore};

/// Short timers so the tests observe expiries without waiting rooms out.
fn test_config() -> RoomConfig {
    RoomConfig {
        settings: GameSettings::default(),
        grace_period_secs: 1,
        color_choice_timeout_secs: 1,
        finished_room_ttl_secs: 1,
    }
}

fn event_channel() -> (mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
    mpsc::channel(64)
}

/// Drain everything currently queued on a client channel.
async fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = timeout(Duration::from_millis(50), rx.recv()).await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn join_attach_and_start_flow() {
    let store = Arc::new(MemoryRoomStore::new());
    let registry = RoomRegistry::new(store.clone(), test_config());

    let (handle, host_reply) = registry
        .create_room(GameKind::WildEights, Nickname::new("ada"))
        .await
        .unwrap();
    let host = host_reply.player;
    assert_eq!(host_reply.snapshot.status, RoomStatus::Waiting);

    let (host_tx, mut host_rx) = event_channel();
    handle.attach(host, host_tx).await.unwrap();
    // Attaching resynchronizes with a personal snapshot.
    let first = timeout(Duration::from_secs(1), host_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(first, ServerEvent::Snapshot { .. }));

    // One seated player is not a game.
    let err = handle
        .command(host, PlayerCommand::StartGame)
        .await
        .unwrap_err();
    assert_eq!(err, GameError::NotEnoughPlayers);

    let (_, guest_reply) = registry
        .join_room(handle.code(), Nickname::new("lin"))
        .await
        .unwrap();
    let guest = guest_reply.player;
    let (guest_tx, mut guest_rx) = event_channel();
    handle.attach(guest, guest_tx).await.unwrap();

    handle.command(host, PlayerCommand::StartGame).await.unwrap();

    let guest_events = drain(&mut guest_rx).await;
    let playing = guest_events.iter().rev().find_map(|event| match event {
        ServerEvent::Snapshot { room } if room.status == RoomStatus::Playing => Some(room),
        _ => None,
    });
    let room = playing.expect("guest saw the started game");

    // Redaction: the guest sees their own cards and only counts for the
    // host's seat.
    let guest_seat = room.seats[1].as_ref().unwrap();
    assert!(matches!(guest_seat.hand, HandView::Cards { ref cards } if cards.len() == 7));
    let host_seat = room.seats[0].as_ref().unwrap();
    assert!(matches!(host_seat.hand, HandView::Hidden { count: 7 }));

    // The start milestone reached the store.
    sleep(Duration::from_millis(100)).await;
    let record = store.load_room(handle.code()).await.unwrap().unwrap();
    assert_eq!(record.status, RoomStatus::Playing);
}

#[tokio::test]
async fn host_grace_expiry_broadcasts_exactly_one_migration() {
    let store = Arc::new(MemoryRoomStore::new());
    let registry = RoomRegistry::new(store, test_config());

    let (handle, host_reply) = registry
        .create_room(GameKind::WildEights, Nickname::new("ada"))
        .await
        .unwrap();
    let host = host_reply.player;
    let (host_tx, _host_rx) = event_channel();
    handle.attach(host, host_tx).await.unwrap();

    let (_, guest_reply) = registry
        .join_room(handle.code(), Nickname::new("lin"))
        .await
        .unwrap();
    let guest = guest_reply.player;
    let (guest_tx, mut guest_rx) = event_channel();
    handle.attach(guest, guest_tx).await.unwrap();

    handle.detach(host).await.unwrap();
    sleep(Duration::from_millis(1500)).await;

    let events = drain(&mut guest_rx).await;
    let migrations: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::HostMigrated { new_host } => Some(*new_host),
            _ => None,
        })
        .collect();
    assert_eq!(migrations, vec![guest]);

    let snapshot = handle.snapshot(Some(guest)).await.unwrap();
    assert_eq!(snapshot.host, Some(guest));
    let old_host_seat = snapshot.seats[0].as_ref().unwrap();
    assert_eq!(old_host_seat.connection, ConnectionState::Offline);
}

#[tokio::test]
async fn reconnecting_inside_the_grace_window_cancels_the_expiry() {
    let store = Arc::new(MemoryRoomStore::new());
    let registry = RoomRegistry::new(store, test_config());

    let (handle, host_reply) = registry
        .create_room(GameKind::WildEights, Nickname::new("ada"))
        .await
        .unwrap();
    let host = host_reply.player;
    let (_, guest_reply) = registry
        .join_room(handle.code(), Nickname::new("lin"))
        .await
        .unwrap();
    let guest = guest_reply.player;
    let (guest_tx, mut guest_rx) = event_channel();
    handle.attach(guest, guest_tx).await.unwrap();

    let (host_tx, _host_rx) = event_channel();
    handle.attach(host, host_tx).await.unwrap();
    handle.detach(host).await.unwrap();

    sleep(Duration::from_millis(300)).await;
    let (host_tx2, _host_rx2) = event_channel();
    handle.attach(host, host_tx2).await.unwrap();

    // Ride out where the stale expiry would have landed.
    sleep(Duration::from_millis(1500)).await;

    let events = drain(&mut guest_rx).await;
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, ServerEvent::HostMigrated { .. }))
    );
    let snapshot = handle.snapshot(None).await.unwrap();
    assert_eq!(snapshot.host, Some(host));
    assert_eq!(
        snapshot.seats[0].as_ref().unwrap().connection,
        ConnectionState::Online
    );
}

#[tokio::test]
async fn an_emptied_room_is_evicted_after_its_ttl() {
    let store = Arc::new(MemoryRoomStore::new());
    let registry = RoomRegistry::new(store, test_config());

    let (handle, host_reply) = registry
        .create_room(GameKind::WildEights, Nickname::new("ada"))
        .await
        .unwrap();
    let code = handle.code().to_string();
    assert_eq!(registry.room_count().await, 1);

    handle
        .command(host_reply.player, PlayerCommand::LeaveRoom)
        .await
        .unwrap();

    sleep(Duration::from_millis(1800)).await;
    assert!(registry.get(&code).await.is_none());
    assert_eq!(registry.room_count().await, 0);
}

#[tokio::test]
async fn commands_for_unknown_rooms_and_players_are_rejected() {
    let store = Arc::new(MemoryRoomStore::new());
    let registry = RoomRegistry::new(store, test_config());

    assert!(matches!(
        registry.join_room("NOSUCH", Nickname::new("ada")).await,
        Err(GameError::RoomNotFound)
    ));

    let (handle, _) = registry
        .create_room(GameKind::WildEights, Nickname::new("ada"))
        .await
        .unwrap();
    let (tx, _rx) = event_channel();
    let stranger = uuid::Uuid::new_v4();
    assert_eq!(
        handle.attach(stranger, tx).await,
        Err(GameError::UnknownPlayer)
    );
}

#[tokio::test]
async fn other_game_kinds_are_not_hosted() {
    let store = Arc::new(MemoryRoomStore::new());
    let registry = RoomRegistry::new(store, test_config());

    let result = registry
        .create_room(GameKind::TicTacToe, Nickname::new("ada"))
        .await;
    assert!(matches!(result, Err(GameError::UnsupportedGame)));
    assert_eq!(registry.room_count().await, 0);
}
