use serde::Serialize;

use peerpost_core::domain::user::UserProfile;

pub const ELEMENT_TEXT: &str = "text";
pub const ELEMENT_HASHTAG1: &str = "hashtag1";
pub const ELEMENT_HASHTAG2: &str = "hashtag2";
pub const ELEMENT_STAMP: &str = "stamp";

pub const KUDOS_CALLBACK_PATH: &str = "/peer/callback";

const MESSAGE_PLACEHOLDER: &str =
    "Thanks for helping me prepare today's meeting.\nIt went smoothly because of you.";

/// Stamp images served under `/stamp/`, as `(label, path)`.
pub const STAMPS: &[(&str, &str)] = &[
    ("Cool", "/stamp/stamp_1.png"),
    ("Cute", "/stamp/stamp_2.png"),
    ("Lovely", "/stamp/stamp_3.png"),
    ("True", "/stamp/stamp_4.png"),
    ("Exactly", "/stamp/stamp_5.png"),
    ("Genius", "/stamp/stamp_6.png"),
    ("Strong", "/stamp/stamp_7.png"),
    ("I get it", "/stamp/stamp_8.png"),
    ("GJ", "/stamp/stamp_9.png"),
    ("Nice", "/stamp/stamp_10.png"),
    ("Excellent", "/stamp/stamp_11.png"),
    ("Go for it", "/stamp/stamp_12.png"),
    ("Legend", "/stamp/stamp_13.png"),
    ("Go to sleep", "/stamp/stamp_14.png"),
    ("As expected", "/stamp/stamp_15.png"),
    ("Let me support you", "/stamp/stamp_16.png"),
    ("World's best", "/stamp/stamp_17.png"),
    ("Fortune", "/stamp/stamp_18.png"),
    ("Fame", "/stamp/stamp_19.png"),
    ("Power", "/stamp/stamp_20.png"),
    ("Awesome", "/stamp/stamp_21.png"),
    ("Precious", "/stamp/stamp_22.png"),
    ("LOL", "/stamp/stamp_23.png"),
    ("Haha", "/stamp/stamp_24.png"),
    ("Support me", "/stamp/stamp_25.png"),
    ("Amazing", "/stamp/stamp_26.png"),
    ("Huh?", "/stamp/stamp_27.png"),
    ("Heart", "/stamp/stamp_28.gif"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Ephemeral,
    InChannel,
}

/// Body returned synchronously to a slash command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    pub response_type: ResponseType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl CommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self { response_type: ResponseType::Ephemeral, text: text.into() }
    }

    /// Acknowledges the command without showing anything.
    pub fn empty() -> Self {
        Self::ephemeral(String::new())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DialogOption {
    pub text: String,
    pub value: String,
}

impl DialogOption {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self { text: text.into(), value: value.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Text,
    Textarea,
    Select,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DialogElement {
    pub display_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub placeholder: String,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<DialogOption>,
}

impl DialogElement {
    fn new(kind: ElementKind, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            name: name.into(),
            kind,
            placeholder: String::new(),
            optional: false,
            min_length: None,
            max_length: None,
            options: Vec::new(),
        }
    }

    pub fn textarea(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(ElementKind::Textarea, name, display_name)
    }

    pub fn select(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(ElementKind::Select, name, display_name)
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn options(mut self, options: Vec<DialogOption>) -> Self {
        self.options = options;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dialog {
    pub callback_id: String,
    pub title: String,
    pub elements: Vec<DialogElement>,
    pub submit_label: String,
    pub notify_on_cancel: bool,
    pub state: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OpenDialogRequest {
    pub trigger_id: String,
    pub url: String,
    pub dialog: Dialog,
}

pub struct DialogBuilder {
    title: String,
    elements: Vec<DialogElement>,
    submit_label: String,
    notify_on_cancel: bool,
    state: String,
}

impl DialogBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
            submit_label: "Submit".to_owned(),
            notify_on_cancel: false,
            state: String::new(),
        }
    }

    pub fn element(mut self, element: DialogElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn submit_label(mut self, label: impl Into<String>) -> Self {
        self.submit_label = label.into();
        self
    }

    pub fn notify_on_cancel(mut self) -> Self {
        self.notify_on_cancel = true;
        self
    }

    /// Opaque value echoed back in the submission.
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn open(self, trigger_id: impl Into<String>, url: impl Into<String>) -> OpenDialogRequest {
        OpenDialogRequest {
            trigger_id: trigger_id.into(),
            url: url.into(),
            dialog: Dialog {
                callback_id: String::new(),
                title: self.title,
                elements: self.elements,
                submit_label: self.submit_label,
                notify_on_cancel: self.notify_on_cancel,
                state: self.state,
            },
        }
    }
}

pub fn stamp_options() -> Vec<DialogOption> {
    STAMPS.iter().map(|(label, path)| DialogOption::new(*label, *path)).collect()
}

pub fn hashtag_dialog_options(hashtags: &[String]) -> Vec<DialogOption> {
    hashtags.iter().map(|tag| DialogOption::new(tag.clone(), tag.clone())).collect()
}

/// Dialog for writing a recognition to `recipient`. The recipient id travels as dialog state.
pub fn kudos_dialog(
    recipient: &UserProfile,
    hashtags: &[String],
    trigger_id: &str,
    callback_url: &str,
) -> OpenDialogRequest {
    let hashtag_options = hashtag_dialog_options(hashtags);

    DialogBuilder::new(format!("Message for {}", recipient.display_name()))
        .element(
            DialogElement::textarea(ELEMENT_TEXT, "Message")
                .placeholder(MESSAGE_PLACEHOLDER)
                .length(1, peerpost_core::kudos::MESSAGE_MAX_CHARS),
        )
        .element(
            DialogElement::select(ELEMENT_HASHTAG1, "Team hashtag 1")
                .options(hashtag_options.clone()),
        )
        .element(
            DialogElement::select(ELEMENT_HASHTAG2, "Team hashtag 2")
                .options(hashtag_options)
                .optional(),
        )
        .element(DialogElement::select(ELEMENT_STAMP, "Stamp").options(stamp_options()))
        .submit_label("Post")
        .notify_on_cancel()
        .state(recipient.id.0.clone())
        .open(trigger_id, callback_url)
}
