//! Rule engine behaviour over whole events, including a property test over
//! every rule's output.

use domain_notifications::payloads::{
    CommentCreatedPayload, CommentRepliedPayload, KeyResultUpdatedPayload, KeyResultUpdates,
    ObjectiveUpdatedPayload, ObjectiveUpdates, StoryCreatedPayload, StoryUpdatedPayload,
    StoryUpdates, UserMentionedPayload,
};
use domain_notifications::{
    DueDate, EntityType, Event, EventType, FieldChange, InMemoryDirectory, NotificationIntent,
    NotificationType, RuleEngine, VariableType,
};
use proptest::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use test_utils::TestDataBuilder;
use uuid::Uuid;

struct World {
    ids: TestDataBuilder,
    users: Vec<Uuid>,
    workspace: Uuid,
    story: Uuid,
    status: Uuid,
    objective: Uuid,
    key_result: Uuid,
}

impl World {
    fn new(test_name: &str) -> Self {
        let ids = TestDataBuilder::from_test_name(test_name);
        let users = ["ada", "grace", "linus", "barbara"]
            .iter()
            .map(|name| ids.id(name))
            .collect();
        Self {
            workspace: ids.id("workspace"),
            story: ids.id("story"),
            status: ids.id("status"),
            objective: ids.id("objective"),
            key_result: ids.id("key_result"),
            users,
            ids,
        }
    }

    fn user(&self, index: usize) -> Uuid {
        self.users[index]
    }

    /// Directory where the story is currently assigned to `story_assignee`.
    fn engine(&self, story_assignee: Option<usize>) -> RuleEngine {
        let directory = ["Ada", "Grace", "Linus", "Barbara"]
            .iter()
            .zip(&self.users)
            .fold(InMemoryDirectory::new(), |dir, (name, id)| {
                dir.with_user(*id, *name)
            })
            .with_story(
                self.story,
                self.workspace,
                "Fix login",
                story_assignee.map(|i| self.user(i)),
            )
            .with_status(self.status, self.workspace, "In Review")
            .with_objective(self.objective, self.workspace, "Grow revenue")
            .with_key_result(self.key_result, self.workspace, "100 paying teams");
        RuleEngine::new(Arc::new(directory))
    }

    fn story_updated(&self, prior: Option<usize>, updates: StoryUpdates) -> StoryUpdatedPayload {
        StoryUpdatedPayload {
            story_id: self.story,
            workspace_id: self.workspace,
            assignee_id: prior.map(|i| self.user(i)),
            updates,
        }
    }
}

fn event<P: Serialize>(event_type: EventType, actor: Uuid, payload: &P) -> Event {
    Event::new(event_type, actor, payload).unwrap()
}

async fn evaluate(engine: &RuleEngine, event: &Event) -> Vec<NotificationIntent> {
    engine.evaluate(event).await.unwrap()
}

fn recipients(intents: &[NotificationIntent]) -> Vec<Uuid> {
    intents.iter().map(|i| i.recipient_id).collect()
}

// ============================================================================
// Assignment
// ============================================================================

#[tokio::test]
async fn new_assignment_notifies_only_the_assignee() {
    let world = World::new("new_assignment");
    let (actor, assignee) = (world.user(0), world.user(1));
    let payload = world.story_updated(
        None,
        StoryUpdates {
            assignee_id: FieldChange::Set(assignee),
            ..Default::default()
        },
    );

    let intents = evaluate(
        &world.engine(None),
        &event(EventType::StoryUpdated, actor, &payload),
    )
    .await;

    assert_eq!(recipients(&intents), vec![assignee]);
    assert_eq!(intents[0].message.render(), "Ada assigned you a task");
    assert_eq!(intents[0].title, "Fix login");
}

#[tokio::test]
async fn reassignment_notifies_previous_and_new_assignee() {
    let world = World::new("reassignment");
    let (actor, previous, next) = (world.user(0), world.user(1), world.user(2));
    let payload = world.story_updated(
        Some(1),
        StoryUpdates {
            assignee_id: FieldChange::Set(next),
            ..Default::default()
        },
    );

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::StoryUpdated, actor, &payload),
    )
    .await;

    assert_eq!(recipients(&intents), vec![previous, next]);
    assert_eq!(
        intents[0].message.render(),
        "Ada reassigned the task to Linus"
    );
    assert_eq!(intents[1].message.render(), "Ada assigned you a task");
}

#[tokio::test]
async fn reassignment_suppresses_each_side_independently() {
    let world = World::new("reassignment_self");
    let (previous, next) = (world.user(1), world.user(2));
    let payload = world.story_updated(
        Some(1),
        StoryUpdates {
            assignee_id: FieldChange::Set(next),
            ..Default::default()
        },
    );

    // The previous assignee hands the story over.
    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::StoryUpdated, previous, &payload),
    )
    .await;
    assert_eq!(recipients(&intents), vec![next]);

    // The new assignee takes the story.
    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::StoryUpdated, next, &payload),
    )
    .await;
    assert_eq!(recipients(&intents), vec![previous]);
    assert_eq!(
        intents[0].message.render(),
        "Linus reassigned the task to themself"
    );
}

#[tokio::test]
async fn unassignment_notifies_previous_assignee() {
    let world = World::new("unassignment");
    let (actor, previous) = (world.user(0), world.user(1));
    let payload = world.story_updated(
        Some(1),
        StoryUpdates {
            assignee_id: FieldChange::Cleared,
            ..Default::default()
        },
    );

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::StoryUpdated, actor, &payload),
    )
    .await;

    assert_eq!(recipients(&intents), vec![previous]);
    assert_eq!(intents[0].message.template(), "{actor} removed your assignment");
}

#[tokio::test]
async fn clearing_an_empty_assignee_is_not_an_assignment_change() {
    let world = World::new("clear_empty");
    let payload = world.story_updated(
        None,
        StoryUpdates {
            assignee_id: FieldChange::Cleared,
            priority: FieldChange::Set("High".into()),
            ..Default::default()
        },
    );

    // No current holder, so the field change has nobody to notify either.
    let intents = evaluate(
        &world.engine(None),
        &event(EventType::StoryUpdated, world.user(0), &payload),
    )
    .await;
    assert!(intents.is_empty());
}

// ============================================================================
// Field updates
// ============================================================================

/// Precedence when several fields change at once: priority, then status,
/// then due date, then the generic "updated" message. One notification only.
#[tokio::test]
async fn field_precedence_priority_beats_status() {
    let world = World::new("priority_beats_status");
    let payload = world.story_updated(
        Some(1),
        StoryUpdates {
            priority: FieldChange::Set("High".into()),
            status_id: FieldChange::Set(world.status),
            end_date: FieldChange::Set(DueDate::parse("2025-03-01").unwrap()),
            ..Default::default()
        },
    );

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::StoryUpdated, world.user(0), &payload),
    )
    .await;

    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].message.render(), "Ada set the priority to High");
}

#[tokio::test]
async fn field_precedence_status_beats_due_date() {
    let world = World::new("status_beats_due_date");
    let payload = world.story_updated(
        Some(1),
        StoryUpdates {
            status_id: FieldChange::Set(world.status),
            end_date: FieldChange::Set(DueDate::parse("2025-03-01").unwrap()),
            ..Default::default()
        },
    );

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::StoryUpdated, world.user(0), &payload),
    )
    .await;

    assert_eq!(intents.len(), 1);
    assert_eq!(
        intents[0].message.render(),
        "Ada changed the status to In Review"
    );
}

#[tokio::test]
async fn field_precedence_falls_back_to_generic_update() {
    let world = World::new("generic_update");
    let mut updates = StoryUpdates::default();
    updates
        .other
        .insert("description".into(), serde_json::json!("new text"));
    let payload = world.story_updated(Some(1), updates);

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::StoryUpdated, world.user(0), &payload),
    )
    .await;

    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].message.render(), "Ada updated the task");
}

#[tokio::test]
async fn due_date_is_formatted_as_day_and_month() {
    let world = World::new("due_date_scenario");
    let (actor, assignee) = (world.user(0), world.user(1));
    let raw = serde_json::json!({
        "story_id": world.story,
        "workspace_id": world.workspace,
        "assignee_id": assignee,
        "updates": {"end_date": "2025-03-01"},
    });

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::StoryUpdated, actor, &raw),
    )
    .await;

    assert_eq!(intents.len(), 1);
    let intent = &intents[0];
    assert_eq!(intent.recipient_id, assignee);
    assert_eq!(intent.message.template(), "{actor} set the {field} to {value}");
    let value = intent.message.variable("value").unwrap();
    assert_eq!(value.value, "1 Mar");
    assert_eq!(value.kind, VariableType::Date);
}

#[tokio::test]
async fn removed_due_date() {
    let world = World::new("removed_due_date");
    let payload = world.story_updated(
        Some(1),
        StoryUpdates {
            end_date: FieldChange::Cleared,
            ..Default::default()
        },
    );

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::StoryUpdated, world.user(0), &payload),
    )
    .await;

    assert_eq!(intents[0].message.render(), "Ada removed the due date");
}

// ============================================================================
// Comments and mentions
// ============================================================================

fn mention(world: &World, mentioned: usize) -> UserMentionedPayload {
    UserMentionedPayload {
        comment_id: world.ids.id("comment"),
        story_id: world.story,
        workspace_id: world.workspace,
        mentioned_user_id: world.user(mentioned),
    }
}

#[tokio::test]
async fn mention_of_current_assignee_is_suppressed() {
    let world = World::new("mention_assignee");
    let payload = mention(&world, 1);

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::UserMentioned, world.user(0), &payload),
    )
    .await;

    assert!(intents.is_empty());
}

#[tokio::test]
async fn mention_of_someone_else_is_delivered() {
    let world = World::new("mention_other");
    let payload = mention(&world, 2);

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::UserMentioned, world.user(0), &payload),
    )
    .await;

    assert_eq!(recipients(&intents), vec![world.user(2)]);
    assert_eq!(intents[0].notification_type, NotificationType::Mention);
    assert_eq!(intents[0].message.render(), "Ada mentioned you in a comment");
}

#[tokio::test]
async fn comment_notifies_assignee_with_content() {
    let world = World::new("comment_assignee");
    let payload = CommentCreatedPayload {
        comment_id: world.ids.id("comment"),
        story_id: world.story,
        workspace_id: world.workspace,
        content: "Looks good".into(),
    };

    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::CommentCreated, world.user(0), &payload),
    )
    .await;
    assert_eq!(recipients(&intents), vec![world.user(1)]);
    assert_eq!(intents[0].message.render(), "Ada commented: Looks good");

    // The assignee commenting on their own story notifies nobody.
    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::CommentCreated, world.user(1), &payload),
    )
    .await;
    assert!(intents.is_empty());
}

#[tokio::test]
async fn reply_notifies_the_parent_author_only() {
    let world = World::new("reply_parent_author");
    let payload = CommentRepliedPayload {
        comment_id: world.ids.id("reply"),
        parent_comment_id: world.ids.id("comment"),
        parent_author_id: world.user(2),
        story_id: world.story,
        workspace_id: world.workspace,
        content: "Done".into(),
    };

    // The story's assignee is not the parent author and hears nothing.
    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::CommentReplied, world.user(0), &payload),
    )
    .await;
    assert_eq!(recipients(&intents), vec![world.user(2)]);
    assert_eq!(intents[0].notification_type, NotificationType::CommentReply);
    assert_eq!(intents[0].entity_id, world.story);
    assert_eq!(intents[0].title, "Fix login");
    assert_eq!(
        intents[0].message.render(),
        "Ada replied to your comment: Done"
    );

    // Replying in your own thread notifies nobody.
    let intents = evaluate(
        &world.engine(Some(1)),
        &event(EventType::CommentReplied, world.user(2), &payload),
    )
    .await;
    assert!(intents.is_empty());
}

// ============================================================================
// Story creation
// ============================================================================

#[tokio::test]
async fn created_story_notifies_its_assignee() {
    let world = World::new("story_created");
    let payload = StoryCreatedPayload {
        story_id: world.story,
        workspace_id: world.workspace,
        assignee_id: Some(world.user(1)),
        title: Some("Write the release notes".into()),
    };

    let intents = evaluate(
        &world.engine(None),
        &event(EventType::StoryCreated, world.user(0), &payload),
    )
    .await;
    assert_eq!(recipients(&intents), vec![world.user(1)]);
    assert_eq!(intents[0].entity_type, EntityType::Story);
    assert_eq!(intents[0].title, "Write the release notes");
    assert_eq!(intents[0].message.render(), "Ada assigned you a task");

    // Creating a story for yourself notifies nobody.
    let intents = evaluate(
        &world.engine(None),
        &event(EventType::StoryCreated, world.user(1), &payload),
    )
    .await;
    assert!(intents.is_empty());
}

#[tokio::test]
async fn created_story_without_assignee_or_title() {
    let world = World::new("story_created_blank");
    let mut payload = StoryCreatedPayload {
        story_id: world.story,
        workspace_id: world.workspace,
        assignee_id: None,
        title: Some("Ignored".into()),
    };

    let intents = evaluate(
        &world.engine(None),
        &event(EventType::StoryCreated, world.user(0), &payload),
    )
    .await;
    assert!(intents.is_empty());

    // A blank title falls back to the directory's title.
    payload.assignee_id = Some(world.user(3));
    payload.title = Some("   ".into());
    let intents = evaluate(
        &world.engine(None),
        &event(EventType::StoryCreated, world.user(0), &payload),
    )
    .await;
    assert_eq!(intents[0].title, "Fix login");
}

// ============================================================================
// Objectives and key results
// ============================================================================

impl World {
    fn objective_updated(&self, prior: Option<usize>, updates: ObjectiveUpdates) -> Event {
        let payload = ObjectiveUpdatedPayload {
            objective_id: self.objective,
            workspace_id: self.workspace,
            owner_id: prior.map(|i| self.user(i)),
            updates,
        };
        event(EventType::ObjectiveUpdated, self.user(0), &payload)
    }

    fn key_result_updated(&self, updates: KeyResultUpdates) -> Event {
        let payload = KeyResultUpdatedPayload {
            key_result_id: self.key_result,
            objective_id: self.objective,
            workspace_id: self.workspace,
            owner_id: Some(self.user(1)),
            updates,
        };
        event(EventType::KeyResultUpdated, self.user(0), &payload)
    }
}

#[tokio::test]
async fn objective_owner_change_wins_over_field_changes() {
    let world = World::new("objective_reassignment");
    let updated = world.objective_updated(
        Some(1),
        ObjectiveUpdates {
            owner_id: FieldChange::Set(world.user(2)),
            status_id: FieldChange::Set(world.status),
            ..Default::default()
        },
    );

    let intents = evaluate(&world.engine(None), &updated).await;

    assert_eq!(recipients(&intents), vec![world.user(1), world.user(2)]);
    assert!(intents
        .iter()
        .all(|i| i.notification_type == NotificationType::ObjectiveUpdate));
    assert_eq!(intents[0].title, "Grow revenue");
    assert_eq!(
        intents[0].message.render(),
        "Ada reassigned the objective to Linus"
    );
    assert_eq!(intents[1].message.render(), "Ada assigned you an objective");
}

#[tokio::test]
async fn objective_field_precedence() {
    let world = World::new("objective_fields");
    let engine = world.engine(None);

    let status_and_due = world.objective_updated(
        Some(1),
        ObjectiveUpdates {
            status_id: FieldChange::Set(world.status),
            due_date: FieldChange::Set(march(1)),
            ..Default::default()
        },
    );
    let intents = evaluate(&engine, &status_and_due).await;
    assert_eq!(recipients(&intents), vec![world.user(1)]);
    assert_eq!(
        intents[0].message.render(),
        "Ada changed the status to In Review"
    );

    let other_only = world.objective_updated(
        Some(1),
        ObjectiveUpdates {
            other: other_fields(true),
            ..Default::default()
        },
    );
    let intents = evaluate(&engine, &other_only).await;
    assert_eq!(intents[0].message.render(), "Ada updated the objective");

    // Without an owner nobody hears about field changes.
    let unowned = world.objective_updated(
        None,
        ObjectiveUpdates {
            status_id: FieldChange::Set(world.status),
            ..Default::default()
        },
    );
    assert!(evaluate(&engine, &unowned).await.is_empty());
}

#[tokio::test]
async fn key_result_field_precedence_status_then_progress_then_due_date() {
    let world = World::new("key_result_fields");
    let engine = world.engine(None);
    let render = |intents: Vec<NotificationIntent>| {
        assert_eq!(recipients(&intents), vec![world.user(1)]);
        assert_eq!(intents[0].notification_type, NotificationType::KeyResultUpdate);
        assert_eq!(intents[0].title, "100 paying teams");
        intents[0].message.render()
    };

    let all = world.key_result_updated(KeyResultUpdates {
        status_id: FieldChange::Set(world.status),
        progress: FieldChange::Set(42.0),
        due_date: FieldChange::Set(march(1)),
        ..Default::default()
    });
    assert_eq!(
        render(evaluate(&engine, &all).await),
        "Ada changed the status to In Review"
    );

    let progress_and_due = world.key_result_updated(KeyResultUpdates {
        progress: FieldChange::Set(42.0),
        due_date: FieldChange::Set(march(1)),
        ..Default::default()
    });
    assert_eq!(
        render(evaluate(&engine, &progress_and_due).await),
        "Ada set the progress to 42%"
    );

    let due_only = world.key_result_updated(KeyResultUpdates {
        due_date: FieldChange::Set(march(1)),
        ..Default::default()
    });
    assert_eq!(
        render(evaluate(&engine, &due_only).await),
        "Ada set the due date to 1 Mar"
    );

    let progress_cleared = world.key_result_updated(KeyResultUpdates {
        progress: FieldChange::Cleared,
        due_date: FieldChange::Set(march(1)),
        ..Default::default()
    });
    assert_eq!(
        render(evaluate(&engine, &progress_cleared).await),
        "Ada removed the progress"
    );
}

// ============================================================================
// Properties over every rule
// ============================================================================

#[derive(Debug, Clone)]
enum Scenario {
    StoryCreated {
        assignee: Option<usize>,
        titled: bool,
    },
    StoryUpdated {
        prior: Option<usize>,
        assignee: FieldChange<usize>,
        status: FieldChange<bool>,
        priority: FieldChange<String>,
        end_date: FieldChange<u32>,
        other: bool,
    },
    CommentCreated,
    CommentReplied {
        parent_author: usize,
    },
    UserMentioned {
        mentioned: usize,
    },
    ObjectiveUpdated {
        prior: Option<usize>,
        owner: FieldChange<usize>,
        status: FieldChange<bool>,
        due_date: FieldChange<u32>,
        other: bool,
    },
    KeyResultUpdated {
        prior: Option<usize>,
        owner: FieldChange<usize>,
        status: FieldChange<bool>,
        progress: FieldChange<f64>,
        due_date: FieldChange<u32>,
    },
}

fn change<T: Clone + std::fmt::Debug + 'static>(
    value: impl Strategy<Value = T> + 'static,
) -> impl Strategy<Value = FieldChange<T>> {
    prop_oneof![
        2 => Just(FieldChange::Unchanged),
        1 => Just(FieldChange::Cleared),
        2 => value.prop_map(FieldChange::Set),
    ]
}

fn map_change<T, U>(change: FieldChange<T>, f: impl FnOnce(T) -> U) -> FieldChange<U> {
    match change {
        FieldChange::Unchanged => FieldChange::Unchanged,
        FieldChange::Cleared => FieldChange::Cleared,
        FieldChange::Set(value) => FieldChange::Set(f(value)),
    }
}

fn user() -> impl Strategy<Value = usize> {
    0usize..4
}

fn scenario() -> impl Strategy<Value = Scenario> {
    prop_oneof![
        (proptest::option::of(user()), any::<bool>())
            .prop_map(|(assignee, titled)| Scenario::StoryCreated { assignee, titled }),
        (
            proptest::option::of(user()),
            change(user()),
            change(any::<bool>()),
            change("(Low|Medium|High)"),
            change(1u32..=28),
            any::<bool>(),
        )
            .prop_map(|(prior, assignee, status, priority, end_date, other)| {
                Scenario::StoryUpdated {
                    prior,
                    assignee,
                    status,
                    priority,
                    end_date,
                    other,
                }
            }),
        Just(Scenario::CommentCreated),
        user().prop_map(|parent_author| Scenario::CommentReplied { parent_author }),
        user().prop_map(|mentioned| Scenario::UserMentioned { mentioned }),
        (
            proptest::option::of(user()),
            change(user()),
            change(any::<bool>()),
            change(1u32..=28),
            any::<bool>(),
        )
            .prop_map(|(prior, owner, status, due_date, other)| {
                Scenario::ObjectiveUpdated {
                    prior,
                    owner,
                    status,
                    due_date,
                    other,
                }
            }),
        (
            proptest::option::of(user()),
            change(user()),
            change(any::<bool>()),
            change(0.0f64..100.0),
            change(1u32..=28),
        )
            .prop_map(|(prior, owner, status, progress, due_date)| {
                Scenario::KeyResultUpdated {
                    prior,
                    owner,
                    status,
                    progress,
                    due_date,
                }
            }),
    ]
}

fn march(day: u32) -> DueDate {
    DueDate::parse(&format!("2025-03-{day:02}")).unwrap()
}

fn other_fields(changed: bool) -> std::collections::BTreeMap<String, serde_json::Value> {
    let mut other = std::collections::BTreeMap::new();
    if changed {
        other.insert("title".to_string(), serde_json::json!("Renamed"));
    }
    other
}

impl World {
    fn status_change(&self, change: FieldChange<bool>) -> FieldChange<Uuid> {
        // `true` picks a known status, `false` one the directory cannot name.
        map_change(change, |known| {
            if known {
                self.status
            } else {
                self.ids.id("unknown_status")
            }
        })
    }

    fn build(&self, actor: Uuid, scenario: Scenario) -> Event {
        let user = |i: usize| self.user(i);
        match scenario {
            Scenario::StoryCreated { assignee, titled } => event(
                EventType::StoryCreated,
                actor,
                &StoryCreatedPayload {
                    story_id: self.story,
                    workspace_id: self.workspace,
                    assignee_id: assignee.map(user),
                    title: titled.then(|| "Fix login".to_string()),
                },
            ),
            Scenario::StoryUpdated {
                prior,
                assignee,
                status,
                priority,
                end_date,
                other,
            } => event(
                EventType::StoryUpdated,
                actor,
                &self.story_updated(
                    prior,
                    StoryUpdates {
                        assignee_id: map_change(assignee, user),
                        status_id: self.status_change(status),
                        priority,
                        end_date: map_change(end_date, march),
                        other: other_fields(other),
                    },
                ),
            ),
            Scenario::CommentCreated => event(
                EventType::CommentCreated,
                actor,
                &CommentCreatedPayload {
                    comment_id: self.ids.id("comment"),
                    story_id: self.story,
                    workspace_id: self.workspace,
                    content: "Ship it".into(),
                },
            ),
            Scenario::CommentReplied { parent_author } => event(
                EventType::CommentReplied,
                actor,
                &CommentRepliedPayload {
                    comment_id: self.ids.id("reply"),
                    parent_comment_id: self.ids.id("comment"),
                    parent_author_id: user(parent_author),
                    story_id: self.story,
                    workspace_id: self.workspace,
                    content: "Done".into(),
                },
            ),
            Scenario::UserMentioned { mentioned } => {
                event(EventType::UserMentioned, actor, &mention(self, mentioned))
            }
            Scenario::ObjectiveUpdated {
                prior,
                owner,
                status,
                due_date,
                other,
            } => event(
                EventType::ObjectiveUpdated,
                actor,
                &ObjectiveUpdatedPayload {
                    objective_id: self.objective,
                    workspace_id: self.workspace,
                    owner_id: prior.map(user),
                    updates: ObjectiveUpdates {
                        owner_id: map_change(owner, user),
                        status_id: self.status_change(status),
                        due_date: map_change(due_date, march),
                        other: other_fields(other),
                    },
                },
            ),
            Scenario::KeyResultUpdated {
                prior,
                owner,
                status,
                progress,
                due_date,
            } => event(
                EventType::KeyResultUpdated,
                actor,
                &KeyResultUpdatedPayload {
                    key_result_id: self.key_result,
                    objective_id: self.objective,
                    workspace_id: self.workspace,
                    owner_id: prior.map(user),
                    updates: KeyResultUpdates {
                        owner_id: map_change(owner, user),
                        status_id: self.status_change(status),
                        progress,
                        due_date: map_change(due_date, march),
                        other: Default::default(),
                    },
                },
            ),
        }
    }
}

impl World {
    /// Everyone an event could legitimately notify.
    fn concerned(&self, scenario: &Scenario, story_assignee: Option<usize>) -> HashSet<Uuid> {
        let set = |change: &FieldChange<usize>| match change {
            FieldChange::Set(i) => Some(*i),
            _ => None,
        };
        let people: Vec<Option<usize>> = match scenario {
            Scenario::StoryCreated { assignee, .. } => vec![*assignee],
            Scenario::StoryUpdated {
                prior, assignee, ..
            } => vec![*prior, set(assignee)],
            Scenario::CommentCreated => vec![story_assignee],
            Scenario::CommentReplied { parent_author } => vec![Some(*parent_author)],
            Scenario::UserMentioned { mentioned } => vec![Some(*mentioned)],
            Scenario::ObjectiveUpdated { prior, owner, .. }
            | Scenario::KeyResultUpdated { prior, owner, .. } => vec![*prior, set(owner)],
        };
        people.into_iter().flatten().map(|i| self.user(i)).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn recipients_are_people_the_event_concerns(
        actor in user(),
        story_assignee in proptest::option::of(user()),
        scenario in scenario(),
    ) {
        let world = World::new("recipients_are_people_the_event_concerns");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let concerned = world.concerned(&scenario, story_assignee);
        let replied_to = match &scenario {
            Scenario::CommentReplied { parent_author } => Some(world.user(*parent_author)),
            _ => None,
        };
        let actor = world.user(actor);
        let event = world.build(actor, scenario);

        let intents = runtime
            .block_on(world.engine(story_assignee).evaluate(&event))
            .unwrap();

        for intent in &intents {
            prop_assert!(
                concerned.contains(&intent.recipient_id),
                "unexpected recipient {}",
                intent.recipient_id
            );
        }
        // A reply reaches its parent author whenever someone else wrote it.
        if let Some(parent) = replied_to.filter(|parent| *parent != actor) {
            prop_assert_eq!(recipients(&intents), vec![parent]);
        }
    }

    #[test]
    fn every_rule_output_is_well_formed(
        actor in user(),
        story_assignee in proptest::option::of(user()),
        scenario in scenario(),
    ) {
        let world = World::new("every_rule_output_is_well_formed");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let actor = world.user(actor);
        let event = world.build(actor, scenario);

        let intents = runtime
            .block_on(world.engine(story_assignee).evaluate(&event))
            .unwrap();

        let mut keys = HashSet::new();
        for intent in &intents {
            // Nobody is notified about their own action.
            prop_assert_ne!(intent.recipient_id, actor);
            prop_assert_eq!(intent.actor_id, actor);
            prop_assert!(keys.insert(intent.dedup_key()), "duplicate {:?}", intent.dedup_key());

            // Placeholders and variables match exactly.
            let mut placeholders: Vec<&str> = intent.message.placeholders();
            placeholders.sort_unstable();
            placeholders.dedup();
            let variables: Vec<&str> =
                intent.message.variables().keys().map(String::as_str).collect();
            prop_assert_eq!(placeholders, variables);

            let leaked = intent.message.render().contains("{actor}");
            prop_assert!(!leaked, "unrendered placeholder in {:?}", intent.message);
            prop_assert!(!intent.title.is_empty());
        }
    }
}
