use tasklist_core::{truncate_to_day, Task, TaskColor, TaskDraft, TaskId, TaskValidationError};

#[test]
fn task_serialization_uses_expected_wire_fields() {
    let task = Task {
        id: TaskId::new(7),
        title: "Buy Milk".to_string(),
        note: "2 litres".to_string(),
        created_at: 1_709_596_800_000,
        color: TaskColor::RED,
        done: false,
        image_path: Some("content://media/42".to_string()),
    };

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["title"], "Buy Milk");
    assert_eq!(json["note"], "2 litres");
    assert_eq!(json["created_at"], 1_709_596_800_000_i64);
    assert_eq!(json["color"], 0xFFFF_0000_u32);
    assert_eq!(json["done"], false);
    assert_eq!(json["image_path"], "content://media/42");

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn draft_deserialization_defaults_done_to_false() {
    let draft: TaskDraft = serde_json::from_str(
        r#"{"title":"x","note":"","created_at":0,"color":0,"image_path":null}"#,
    )
    .unwrap();
    assert!(!draft.done);
    assert_eq!(draft.color, TaskColor::TRANSPARENT);
}

#[test]
fn to_draft_copies_editable_fields() {
    let task = Task {
        id: TaskId::new(1),
        title: "t".to_string(),
        note: "n".to_string(),
        created_at: 5,
        color: TaskColor::GREEN,
        done: true,
        image_path: None,
    };

    let mut expected = TaskDraft::new("t", 5)
        .with_note("n")
        .with_color(TaskColor::GREEN);
    expected.done = true;
    assert_eq!(task.to_draft(), expected);
}

#[test]
fn validation_rejects_blank_titles_only() {
    assert_eq!(
        TaskDraft::new("", 0).validate(),
        Err(TaskValidationError::BlankTitle)
    );
    assert!(TaskDraft::new("a", 0).validate().is_ok());
    assert_eq!(
        TaskValidationError::BlankTitle.to_string(),
        "title cannot be empty"
    );
}

#[test]
fn day_truncation_is_idempotent() {
    let day = truncate_to_day(1_709_646_312_345);
    assert_eq!(day % 86_400_000, 0);
    assert_eq!(truncate_to_day(day), day);
}
