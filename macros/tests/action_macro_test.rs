//! Tests for #[derive(Action)] macro

use tasklist_core::action::ActionKind;
use tasklist_macros::Action;

#[derive(Action, Clone, Debug, PartialEq)]
enum TaskAction {
    #[command]
    ReloadTasks,

    #[command]
    DeleteTask { id: String },

    #[command]
    EditNewTaskText(String),

    #[event]
    TasksReceived {
        items: Vec<String>,
        next_page_token: Option<String>,
    },

    #[event]
    TaskServiceFailed { message: String },

    Unknown,
}

#[test]
fn test_kind_is_variant_name() {
    assert_eq!(TaskAction::ReloadTasks.kind(), "ReloadTasks");
    assert_eq!(TaskAction::DeleteTask { id: "a".to_string() }.kind(), "DeleteTask");
    assert_eq!(TaskAction::EditNewTaskText("bar".to_string()).kind(), "EditNewTaskText");
    assert_eq!(TaskAction::Unknown.kind(), "Unknown");
}

#[test]
fn test_kinds_in_declaration_order() {
    assert_eq!(
        TaskAction::KINDS,
        &[
            "ReloadTasks",
            "DeleteTask",
            "EditNewTaskText",
            "TasksReceived",
            "TaskServiceFailed",
            "Unknown",
        ]
    );
}

#[test]
fn test_is_command() {
    let action = TaskAction::DeleteTask { id: "a".to_string() };
    assert!(action.is_command());
    assert!(!action.is_event());
}

#[test]
fn test_is_event() {
    let action = TaskAction::TasksReceived {
        items: vec!["a".to_string()],
        next_page_token: None,
    };
    assert!(!action.is_command());
    assert!(action.is_event());
}

#[test]
fn test_unmarked_variant_is_neither() {
    assert!(!TaskAction::Unknown.is_command());
    assert!(!TaskAction::Unknown.is_event());
}

#[test]
fn test_all_commands_identified() {
    let commands = vec![
        TaskAction::ReloadTasks,
        TaskAction::DeleteTask { id: "a".to_string() },
        TaskAction::EditNewTaskText("draft".to_string()),
    ];

    for cmd in commands {
        assert!(cmd.is_command(), "Expected command: {cmd:?}");
        assert!(!cmd.is_event(), "Should not be event: {cmd:?}");
    }
}

#[test]
fn test_all_events_identified() {
    let events = vec![
        TaskAction::TasksReceived {
            items: vec![],
            next_page_token: Some("abc".to_string()),
        },
        TaskAction::TaskServiceFailed {
            message: "boom".to_string(),
        },
    ];

    for event in events {
        assert!(!event.is_command(), "Should not be command: {event:?}");
        assert!(event.is_event(), "Expected event: {event:?}");
    }
}
