use std::time::Duration;

use crate::helpers::test_app::{RoomCreatedResponse, TestApp};
use crate::helpers::test_player::{Snapshot, TestPlayer, TestWatcher};

#[tokio::test]
async fn create_room_returns_code_and_credentials() {
    let app = TestApp::spawn_app().await;

    let response = app.create_room("ana").await;

    assert!(response.status().is_success());
    let created: RoomCreatedResponse = response.json().await.unwrap();
    assert_eq!(created.room_code.len(), 4);
    assert!(created.room_code.chars().all(|c| c.is_ascii_uppercase()));
    assert_eq!(created.session_token.len(), 64);
    assert_eq!(created.player_name, "ana");
}

#[tokio::test]
async fn create_room_rejects_blank_names() {
    let app = TestApp::spawn_app().await;

    let response = app.create_room("   ").await;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn snapshot_of_unknown_room_is_not_found() {
    let app = TestApp::spawn_app().await;

    let response = app.get_snapshot("ZZZZ", None).await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn snapshot_of_malformed_code_is_a_bad_request() {
    let app = TestApp::spawn_app().await;

    let response = app.get_snapshot("AB1", None).await;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn snapshot_shows_the_lobby_with_the_host() {
    let (app, code, host) = TestApp::create_room_with_host("ana").await;

    let response = app.get_snapshot(&code, Some(host.player_id)).await;

    assert!(response.status().is_success());
    let snapshot: serde_json::Value = response.json().await.unwrap();
    assert_eq!(snapshot["phase"], "LOBBY");
    assert_eq!(snapshot["roomCode"], code);
    assert_eq!(snapshot["players"][0]["name"], "ana");
    assert_eq!(snapshot["players"][0]["isHost"], true);
}

#[tokio::test]
async fn joining_players_appear_in_the_lobby() {
    let (app, code, mut host) = TestApp::create_room_with_host("ana").await;

    let (_guest, snapshot) = TestPlayer::connect(&app, &code, "bob").await;

    assert_eq!(snapshot.phase, "LOBBY");
    assert_eq!(snapshot.players.len(), 2);
    assert!(!snapshot.player("bob").is_host);

    let host_view = host.receive_room_state().await.unwrap();
    assert_eq!(host_view.players.len(), 2);
}

#[tokio::test]
async fn colliding_names_are_disambiguated() {
    let (app, code, mut host) = TestApp::create_room_with_host("ana").await;

    let (guest, snapshot) = TestPlayer::connect(&app, &code, "Ana").await;

    assert_eq!(guest.name, "Ana#2");
    assert!(snapshot.players.iter().any(|player| player.name == "Ana#2"));
    let _ = host.receive_room_state().await;
}

#[tokio::test]
async fn non_host_player_cannot_start_the_game() {
    let (app, code, mut host) = TestApp::create_room_with_host("ana").await;
    let (mut guest, _) = TestPlayer::connect(&app, &code, "bob").await;
    let _ = host.receive_room_state().await;

    let result = guest.start_game().await;

    assert_eq!(result.err(), Some("FORBIDDEN".to_string()));
}

#[tokio::test]
async fn the_game_cannot_start_with_a_single_player() {
    let (_app, _code, mut host) = TestApp::create_room_with_host("ana").await;

    let result = host.start_game().await;

    assert_eq!(result.err(), Some("INVALID_STATE".to_string()));
}

#[tokio::test]
async fn rejoining_with_a_session_preserves_the_identity() {
    let (app, code, mut host) = TestApp::create_room_with_host("ana").await;
    let (guest, _) = TestPlayer::connect(&app, &code, "bob").await;
    let _ = host.receive_room_state().await;
    let guest_id = guest.player_id;
    let guest_token = guest.session_token.clone();
    drop(guest);

    let rejoined =
        TestPlayer::connect_with_session(&app, &code, "bob", guest_id, &guest_token).await;

    assert_eq!(rejoined.player_id, guest_id);
    let response = app.get_snapshot(&code, Some(guest_id)).await;
    let snapshot: serde_json::Value = response.json().await.unwrap();
    assert_eq!(snapshot["players"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn leaving_the_lobby_removes_the_player() {
    let (app, code, mut host) = TestApp::create_room_with_host("ana").await;
    let (mut guest, _) = TestPlayer::connect(&app, &code, "bob").await;
    let _ = host.receive_room_state().await;

    guest.leave().await;

    let host_view = host.receive_room_state().await.unwrap();
    assert_eq!(host_view.players.len(), 1);
    assert_eq!(host_view.players[0].name, "ana");
}

#[tokio::test]
async fn spectators_receive_live_snapshots_without_joining() {
    let (app, code, mut host) = TestApp::create_room_with_host("ana").await;

    let mut watcher = TestWatcher::open(&app, &code, None).await;
    let lobby = watcher.receive_room_state().await.unwrap();
    assert_eq!(lobby.phase, "LOBBY");
    assert_eq!(lobby.players.len(), 1);
    let _ = host.receive_room_state().await;

    let (_guest, _) = TestPlayer::connect(&app, &code, "bob").await;
    let _ = host.receive_room_state().await;

    let updated = watcher.receive_room_state().await.unwrap();
    assert_eq!(updated.players.len(), 2);
}

#[tokio::test]
async fn watching_an_unknown_room_reports_not_found() {
    let app = TestApp::spawn_app().await;

    let mut watcher = TestWatcher::open(&app, "ZZZZ", None).await;

    assert_eq!(
        watcher.receive_room_state().await.err(),
        Some("NOT_FOUND".to_string())
    );
}

#[tokio::test]
async fn room_is_removed_after_inactivity() {
    let (app, code, host) = TestApp::create_room_with_host("ana").await;
    drop(host);

    tokio::time::sleep(app.inactivity_timeout + Duration::from_millis(1500)).await;

    let response = app.get_snapshot(&code, None).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn voting_for_an_unknown_option_is_rejected() {
    let (app, code, mut host) = TestApp::create_room_with_host("ana").await;
    let (mut guest, _) = TestPlayer::connect(&app, &code, "bob").await;
    let _ = host.receive_room_state().await;
    start_round(&mut host, &mut guest, "smells like rain", "an old rock").await;

    let result = host.vote("player-1-bogus").await;

    assert_eq!(result.err(), Some("INVALID_INPUT".to_string()));
}

#[tokio::test]
async fn submitting_an_empty_definition_is_rejected() {
    let (app, code, mut host) = TestApp::create_room_with_host("ana").await;
    let (mut guest, _) = TestPlayer::connect(&app, &code, "bob").await;
    let _ = host.receive_room_state().await;

    let state = host.start_game().await.unwrap();
    assert_eq!(state.phase, "WRITING");
    let _ = guest.receive_room_state().await;

    let result = host.submit_definition("   ").await;

    assert_eq!(result.err(), Some("INVALID_INPUT".to_string()));
}

#[tokio::test]
async fn a_full_game_runs_over_two_rounds_and_back_to_the_lobby() {
    let (app, code, mut host) = TestApp::create_room_with_host("ana").await;
    let (mut guest, snapshot) = TestPlayer::connect(&app, &code, "bob").await;
    assert_eq!(snapshot.players.len(), 2);
    let _ = host.receive_room_state().await;

    // Round 1: the guest earns one point from the host falling for their
    // bluff and two more for finding the correct definition.
    let voting =
        start_round(&mut host, &mut guest, "smell of rain on dust", "a kind of rock").await;
    let first_word = voting.round.as_ref().unwrap().word.clone();

    let guest_bluff = option_with_text(&voting, "A kind of rock");
    let correct = correct_option(&voting, &["A kind of rock", "Smell of rain on dust"]);

    let state = host.vote(&guest_bluff).await.unwrap();
    assert_eq!(state.round.as_ref().unwrap().voted_count, 1);
    assert_eq!(
        state.round.as_ref().unwrap().your_vote,
        Some(guest_bluff.clone())
    );
    let _ = guest.receive_room_state().await;

    let results = guest.vote(&correct).await.unwrap();
    assert_eq!(results.phase, "ROUND_RESULTS");
    let round = results.round.as_ref().unwrap();
    assert_eq!(round.correct_option_id, Some(correct));
    let deltas = round.score_deltas.as_ref().unwrap();
    assert_eq!(deltas[&guest.player_id], 3);
    assert_eq!(deltas[&host.player_id], 0);
    assert_eq!(results.player("bob").score, 3);
    assert_eq!(results.player("ana").score, 0);
    assert_eq!(round.votes.as_ref().unwrap().len(), 2);
    let _ = host.receive_room_state().await;

    // Round 2: both find the correct definition.
    let state = host.next_round().await.unwrap();
    assert_eq!(state.phase, "WRITING");
    assert_eq!(state.round_number, 2);
    assert_ne!(state.round.as_ref().unwrap().word, first_word);
    let _ = guest.receive_room_state().await;

    let voting = submit_both(&mut host, &mut guest, "woven out of reeds", "a winter wind").await;
    let correct = correct_option(&voting, &["Woven out of reeds", "A winter wind"]);

    let state = host.vote(&correct).await.unwrap();
    assert_eq!(state.phase, "VOTING");
    let _ = guest.receive_room_state().await;

    let finals = guest.vote(&correct).await.unwrap();
    assert_eq!(finals.phase, "FINAL_RESULTS");
    assert_eq!(finals.player("bob").score, 5);
    assert_eq!(finals.player("ana").score, 2);
    let _ = host.receive_room_state().await;

    // Back to a fresh lobby.
    let lobby = host.play_again().await.unwrap();
    assert_eq!(lobby.phase, "LOBBY");
    assert!(lobby.round.is_none());
    assert_eq!(lobby.round_number, 0);
    assert!(lobby.players.iter().all(|player| player.score == 0));
    let _ = guest.receive_room_state().await;
}

/// Starts the game and drives both players through the writing phase,
/// returning the first VOTING snapshot seen by the host.
async fn start_round(
    host: &mut TestPlayer,
    guest: &mut TestPlayer,
    host_text: &str,
    guest_text: &str,
) -> Snapshot {
    let state = host.start_game().await.unwrap();
    assert_eq!(state.phase, "WRITING");
    assert!(state.round.as_ref().unwrap().options.is_empty());
    let _ = guest.receive_room_state().await;

    submit_both(host, guest, host_text, guest_text).await
}

async fn submit_both(
    host: &mut TestPlayer,
    guest: &mut TestPlayer,
    host_text: &str,
    guest_text: &str,
) -> Snapshot {
    let state = host.submit_definition(host_text).await.unwrap();
    assert!(state.round.as_ref().unwrap().you_submitted);
    let _ = guest.receive_room_state().await;

    let state = guest.submit_definition(guest_text).await.unwrap();
    assert_eq!(state.round.as_ref().unwrap().submitted_count, 2);
    let _ = host.receive_room_state().await;

    // The normalized definitions come back in a separate broadcast.
    let voting = host.receive_room_state().await.unwrap();
    assert_eq!(voting.phase, "VOTING");
    assert_eq!(voting.round.as_ref().unwrap().options.len(), 3);
    let _ = guest.receive_room_state().await;
    voting
}

fn option_with_text(snapshot: &Snapshot, text: &str) -> String {
    snapshot
        .round
        .as_ref()
        .unwrap()
        .options
        .iter()
        .find(|option| option.text == text)
        .unwrap_or_else(|| panic!("no option with text {text}"))
        .id
        .clone()
}

fn correct_option(snapshot: &Snapshot, bluff_texts: &[&str]) -> String {
    snapshot
        .round
        .as_ref()
        .unwrap()
        .options
        .iter()
        .find(|option| !bluff_texts.contains(&option.text.as_str()))
        .expect("the correct option is always present")
        .id
        .clone()
}
