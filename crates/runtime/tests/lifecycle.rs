//! Session lifecycle: auto-start, reconciliation, cancellation, teardown.

mod support;

use std::sync::Arc;

use serde_json::json;

use action_core::{
    ActionSpec, Candidates, Choice, ElementRef, ElementTarget, PlayerId, Repeat, Selection,
    SelectionKind,
};
use action_runtime::{
    BridgeCommand, BridgeInput, Event, ExecuteResponse, SessionController, SessionError,
    SessionEvent, StepResponse, TeardownReason, Topic,
};

use support::ScriptedServer;

fn controller(server: &Arc<ScriptedServer>) -> SessionController {
    let server: Arc<ScriptedServer> = Arc::clone(server);
    SessionController::new(PlayerId(1), server)
}

fn move_spec() -> ActionSpec {
    ActionSpec::new(
        "move",
        vec![
            Selection::new(
                "piece",
                SelectionKind::Element,
                Candidates::Elements(vec![
                    ElementTarget::new(ElementRef::new("p1"), "Rook"),
                    ElementTarget::new(ElementRef::new("p2"), "Knight"),
                ]),
            ),
            Selection::new(
                "square",
                SelectionKind::Choice,
                Candidates::Choices(vec![
                    Choice::new("a4", "a4").with_element(ElementRef::new("sq/a4")),
                    Choice::new("c3", "c3").with_element(ElementRef::new("sq/c3")),
                ]),
            ),
        ],
    )
}

fn pass_spec() -> ActionSpec {
    ActionSpec::new(
        "pass",
        vec![Selection::new(
            "token",
            SelectionKind::Choice,
            Candidates::Choices(vec![Choice::new("t", "T")]),
        )],
    )
}

#[tokio::test]
async fn sole_spatial_action_auto_starts_into_configuring() {
    support::init_tracing();
    let server = Arc::new(ScriptedServer::new());
    let mut controller = controller(&server);
    let mut bridge_rx = controller.subscribe(Topic::Bridge);

    controller.update_available(vec![move_spec()]).await.unwrap();

    assert!(controller.is_configuring());
    assert!(server.executed().is_empty());

    // The surface learned which elements answer the first prompt.
    let event = bridge_rx.recv().await.unwrap();
    match event {
        Event::Bridge(BridgeCommand::SetValidElements { elements }) => {
            assert_eq!(elements, vec![ElementRef::new("p1"), ElementRef::new("p2")]);
        }
        other => panic!("expected SetValidElements, got {other:?}"),
    }
}

#[tokio::test]
async fn sole_non_spatial_action_waits_for_an_explicit_start() {
    let server = Arc::new(ScriptedServer::new());
    let mut controller = controller(&server);

    controller.update_available(vec![pass_spec()]).await.unwrap();

    assert!(!controller.is_configuring());
    assert!(server.executed().is_empty());
}

#[tokio::test]
async fn board_clicks_flow_through_the_same_mutation_path() {
    let server = Arc::new(ScriptedServer::new());
    let mut controller = controller(&server);
    controller.update_available(vec![move_spec()]).await.unwrap();

    controller
        .bridge_input(BridgeInput::ElementClicked {
            element: ElementRef::new("p2"),
        })
        .await
        .unwrap();
    controller
        .bridge_input(BridgeInput::ElementClicked {
            element: ElementRef::new("sq/c3"),
        })
        .await
        .unwrap();

    let executed = server.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].args["piece"], json!("p2"));
    // Clicking a spatial candidate of a Choice selection binds its value.
    assert_eq!(executed[0].args["square"], json!("c3"));
}

#[tokio::test]
async fn drag_and_drop_binds_source_then_target() {
    let server = Arc::new(ScriptedServer::new());
    let mut controller = controller(&server);
    controller.update_available(vec![move_spec()]).await.unwrap();

    controller
        .bridge_input(BridgeInput::DragDropped {
            element: ElementRef::new("p1"),
            target: ElementRef::new("sq/a4"),
        })
        .await
        .unwrap();

    let executed = server.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].args["piece"], json!("p1"));
    assert_eq!(executed[0].args["square"], json!("a4"));
}

#[tokio::test]
async fn vanished_action_is_torn_down_silently() {
    let server = Arc::new(ScriptedServer::new());
    let mut controller = controller(&server);
    let mut session_rx = controller.subscribe(Topic::Session);

    controller
        .update_available(vec![pass_spec(), move_spec()])
        .await
        .unwrap();
    controller.start("pass").await.unwrap();

    // `pass` disappeared; the half-configured session must not survive.
    controller.update_available(vec![move_spec()]).await.unwrap();

    assert!(!controller.is_configuring() || controller.session().unwrap().action_name() != "pass");
    let mut saw_teardown = false;
    while let Ok(event) = session_rx.try_recv() {
        if let Event::Session(SessionEvent::TornDown { action, reason }) = event {
            assert_eq!(action, "pass");
            assert_eq!(reason, TeardownReason::Unavailable);
            saw_teardown = true;
        }
    }
    assert!(saw_teardown);
}

#[tokio::test]
async fn wholesale_replacement_without_overlap_resets_configuration() {
    let server = Arc::new(ScriptedServer::new());
    let mut controller = controller(&server);

    controller
        .update_available(vec![pass_spec(), move_spec()])
        .await
        .unwrap();
    controller.start("pass").await.unwrap();
    assert!(controller.is_configuring());

    let unrelated = ActionSpec::new(
        "mulligan",
        vec![Selection::new(
            "hand",
            SelectionKind::Choice,
            Candidates::Choices(vec![Choice::new("keep", "Keep"), Choice::new("redraw", "Redraw")]),
        )],
    );
    controller.update_available(vec![unrelated]).await.unwrap();

    assert!(!controller.is_configuring());
}

#[tokio::test]
async fn stale_sole_action_does_not_retrigger_auto_start() {
    let server = Arc::new(ScriptedServer::new());
    let mut controller = controller(&server);
    let end_turn = ActionSpec::new("end_turn", vec![]);

    controller.update_available(vec![end_turn.clone()]).await.unwrap();
    assert_eq!(server.executed().len(), 1);

    // A stale notification still names end_turn as the only action.
    controller.update_available(vec![end_turn.clone()]).await.unwrap();
    assert_eq!(server.executed().len(), 1);

    // Once the availability view moves on and back, it may fire again.
    controller.update_available(vec![]).await.unwrap();
    controller.update_available(vec![end_turn]).await.unwrap();
    assert_eq!(server.executed().len(), 2);
}

#[tokio::test]
async fn cancel_mid_repeating_notifies_the_server() {
    let server = Arc::new(ScriptedServer::new());
    server.push_step(Ok(StepResponse {
        success: true,
        done: false,
        next_choices: Some(vec![Choice::new("b", "B")]),
        ..Default::default()
    }));

    let mut controller = controller(&server);
    controller
        .update_available(vec![ActionSpec::new(
            "draft",
            vec![Selection::new(
                "draft_pick",
                SelectionKind::Choice,
                Candidates::Choices(vec![Choice::new("a", "A"), Choice::new("b", "B")]),
            )
            .repeating(Repeat::default())],
        )])
        .await
        .unwrap();
    controller.start("draft").await.unwrap();
    controller.set_value("draft_pick", json!("a")).await.unwrap();

    controller.cancel().await.unwrap();

    assert!(!controller.is_configuring());
    let cancellations = server.cancellations.lock().unwrap();
    assert_eq!(
        cancellations.as_slice(),
        &[(PlayerId(1), "draft".to_string(), "draft_pick".to_string())]
    );
}

#[tokio::test]
async fn cancel_without_a_session_is_an_error() {
    let server = Arc::new(ScriptedServer::new());
    let mut controller = controller(&server);
    assert!(matches!(
        controller.cancel().await,
        Err(SessionError::NoSession)
    ));
}

#[tokio::test]
async fn starting_a_new_action_supersedes_the_old_session() {
    let server = Arc::new(ScriptedServer::new());
    let mut controller = controller(&server);
    let mut session_rx = controller.subscribe(Topic::Session);

    controller
        .update_available(vec![pass_spec(), move_spec()])
        .await
        .unwrap();
    controller.start("pass").await.unwrap();
    controller.start("move").await.unwrap();

    assert_eq!(controller.session().unwrap().action_name(), "move");

    let mut reasons = Vec::new();
    while let Ok(event) = session_rx.try_recv() {
        if let Event::Session(SessionEvent::TornDown { reason, .. }) = event {
            reasons.push(reason);
        }
    }
    assert_eq!(reasons, vec![TeardownReason::Superseded]);
}

#[tokio::test]
async fn failed_execution_still_clears_the_session() {
    let server = Arc::new(ScriptedServer::new());
    server.push_execution(Ok(ExecuteResponse {
        success: false,
        error: Some("illegal move".to_string()),
        ..Default::default()
    }));

    let mut controller = controller(&server);
    let mut session_rx = controller.subscribe(Topic::Session);
    controller
        .update_available(vec![pass_spec(), move_spec()])
        .await
        .unwrap();
    controller.start("pass").await.unwrap();

    let err = controller.set_value("token", json!("t")).await.unwrap_err();
    assert!(matches!(err, SessionError::ExecutionFailed { .. }));

    // The filled arguments are gone regardless of the failure.
    assert!(!controller.is_configuring());
    let mut saw_failure = false;
    while let Ok(event) = session_rx.try_recv() {
        if let Event::Session(SessionEvent::Submitted { success, error, .. }) = event {
            assert!(!success);
            assert_eq!(error.as_deref(), Some("illegal move"));
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn action_complete_step_tears_down_without_submission() {
    let server = Arc::new(ScriptedServer::new());
    server.push_step(Ok(StepResponse {
        success: true,
        action_complete: true,
        ..Default::default()
    }));

    let mut controller = controller(&server);
    controller
        .update_available(vec![ActionSpec::new(
            "draft",
            vec![Selection::new(
                "draft_pick",
                SelectionKind::Choice,
                Candidates::Choices(vec![Choice::new("a", "A")]),
            )
            .repeating(Repeat::default())],
        )])
        .await
        .unwrap();
    controller.start("draft").await.unwrap();

    controller.set_value("draft_pick", json!("a")).await.unwrap();

    assert!(!controller.is_configuring());
    assert_eq!(controller.last_executed(), Some("draft"));
    // The server resolved the action itself; no execute call follows.
    assert!(server.executed().is_empty());
}
