//! Sequence diagram model

use serde::{Deserialize, Serialize};

use crate::core::{ArrowHead, LineStyle, Stroke};

/// How a participant head is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    #[default]
    Participant,
    Actor,
}

/// A lifeline owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: ParticipantKind,
}

impl Participant {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind: ParticipantKind::Participant,
        }
    }

    pub fn actor(id: impl Into<String>) -> Self {
        Self {
            kind: ParticipantKind::Actor,
            ..Self::new(id)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn text(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Arrow style of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStyle {
    #[default]
    Sync,
    Async,
    Reply,
}

impl MessageStyle {
    pub fn stroke(&self) -> Stroke {
        match self {
            MessageStyle::Sync => Stroke::new(LineStyle::Solid).with_end(ArrowHead::Filled),
            MessageStyle::Async => Stroke::new(LineStyle::Solid).with_end(ArrowHead::Open),
            MessageStyle::Reply => Stroke::new(LineStyle::Dashed).with_end(ArrowHead::Open),
        }
    }
}

/// One entry in the timeline, top to bottom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SequenceEvent {
    Message {
        from: String,
        to: String,
        #[serde(default)]
        label: String,
        #[serde(default)]
        style: MessageStyle,
    },
    Note {
        over: Vec<String>,
        text: String,
    },
    Activate {
        id: String,
    },
    Deactivate {
        id: String,
    },
}

impl SequenceEvent {
    pub fn message(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        SequenceEvent::Message {
            from: from.into(),
            to: to.into(),
            label: label.into(),
            style: MessageStyle::Sync,
        }
    }

    pub fn reply(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        SequenceEvent::Message {
            from: from.into(),
            to: to.into(),
            label: label.into(),
            style: MessageStyle::Reply,
        }
    }

    pub fn note<S: Into<String>>(over: impl IntoIterator<Item = S>, text: impl Into<String>) -> Self {
        SequenceEvent::Note {
            over: over.into_iter().map(Into::into).collect(),
            text: text.into(),
        }
    }
}

/// A sequence diagram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDiagram {
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub events: Vec<SequenceEvent>,
}

impl SequenceDiagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.participants.push(participant);
        self
    }

    pub fn with_event(mut self, event: SequenceEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// `(from, to)` of every message between known participants, in order
    pub fn messages(&self) -> Vec<(&str, &str)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SequenceEvent::Message { from, to, .. }
                    if self.participant(from).is_some() && self.participant(to).is_some() =>
                {
                    Some((from.as_str(), to.as_str()))
                }
                _ => None,
            })
            .collect()
    }
}
