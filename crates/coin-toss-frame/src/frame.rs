//! Frame protocol types: meta tags, JSON frames and action bodies.

use serde::{Deserialize, Serialize};

use crate::config::Config;

pub const FRAME_VERSION: &str = "vNext";
pub const ASPECT_RATIO: &str = "1.91:1";
pub const TITLE: &str = "Coin Toss Game";
pub const DESCRIPTION: &str = "A simple coin toss betting game on Farcaster";
pub const FLIP_BUTTON: &str = "Flip Coin";
pub const PLAY_AGAIN_BUTTON: &str = "Play Again";
pub const BET_PROMPT: &str = "Place your bet (in ETH)";
/// Static frame image generated into the public directory
pub const STATIC_IMAGE: &str = "/coin-toss-frame.png";

/// Fields a client needs to render the frame at all
pub const REQUIRED_FIELDS: [&str; 4] = [
    "fc:frame",
    "fc:frame:image",
    "fc:frame:button:1",
    "fc:frame:post_url",
];

/// `fc:frame*` and `og:*` meta tags of the entry frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameMetadata {
    pub version: String,
    pub image: String,
    pub button_1: String,
    pub input_text: String,
    pub post_url: String,
    pub state: String,
    pub aspect_ratio: String,
    pub title: String,
    pub description: String,
}

impl FrameMetadata {
    pub fn for_config(config: &Config) -> Self {
        Self {
            version: FRAME_VERSION.to_string(),
            image: config.url("/api/frame"),
            button_1: FLIP_BUTTON.to_string(),
            input_text: BET_PROMPT.to_string(),
            post_url: config.url("/api/frame"),
            state: "initial".to_string(),
            aspect_ratio: ASPECT_RATIO.to_string(),
            title: TITLE.to_string(),
            description: DESCRIPTION.to_string(),
        }
    }

    /// Frame tags in document order
    pub fn frame_tags(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("fc:frame", self.version.as_str()),
            ("fc:frame:image", self.image.as_str()),
            ("fc:frame:button:1", self.button_1.as_str()),
            ("fc:frame:input:text", self.input_text.as_str()),
            ("fc:frame:post_url", self.post_url.as_str()),
            ("fc:frame:state", self.state.as_str()),
            ("fc:frame:image:aspect_ratio", self.aspect_ratio.as_str()),
        ]
    }

    pub fn required_fields(&self) -> &'static [&'static str] {
        &REQUIRED_FIELDS
    }

    /// Required fields whose value is empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.frame_tags()
            .into_iter()
            .filter(|(name, value)| REQUIRED_FIELDS.contains(name) && value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    /// Frame tags as a JSON object, leaving out the round-trip state
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .frame_tags()
            .into_iter()
            .filter(|(name, _)| *name != "fc:frame:state")
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::Value::Object(map)
    }

    /// `<meta>` elements for a document head
    pub fn meta_tags(&self) -> String {
        let mut tags = vec![
            meta("og:title", &self.title),
            meta("og:description", &self.description),
            meta("og:image", &self.image),
        ];
        tags.extend(self.frame_tags().into_iter().map(|(k, v)| meta(k, v)));
        tags.join("\n    ")
    }

    /// Minimal document carrying the frame tags
    pub fn to_html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n  <head>\n    <title>{title}</title>\n    {tags}\n  </head>\n  <body>\n    <h1>{title}</h1>\n    <p>{description}</p>\n  </body>\n</html>",
            title = escape_html(&self.title),
            description = escape_html(&self.description),
            tags = self.meta_tags(),
        )
    }
}

fn meta(property: &str, content: &str) -> String {
    format!(
        r#"<meta property="{}" content="{}" />"#,
        escape_html(property),
        escape_html(content)
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Landing page shared on Farcaster
pub fn home_page(config: &Config) -> String {
    let metadata = FrameMetadata::for_config(config);
    let wallet = config
        .wallet_connect_project_id
        .as_deref()
        .map(|id| {
            format!(
                "\n    <meta name=\"walletconnect:project-id\" content=\"{}\" />",
                escape_html(id)
            )
        })
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n  <head>\n    <title>{title}</title>\n    {tags}{wallet}\n  </head>\n  <body>\n    <main>\n      <h1>{title}</h1>\n      <p>{description}</p>\n      <p>Share this URL on Farcaster to play: {url}</p>\n    </main>\n  </body>\n</html>",
        title = escape_html(&metadata.title),
        description = escape_html(&metadata.description),
        tags = metadata.meta_tags(),
        url = escape_html(&config.app_url),
    )
}

// ============ JSON frames ============

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameButton {
    pub label: String,
    pub action: String,
}

impl FrameButton {
    pub fn post(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: "post".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInput {
    pub text: String,
}

/// A frame returned as JSON
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePayload {
    pub image: String,
    pub buttons: Vec<FrameButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<FrameInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win: Option<bool>,
}

impl FramePayload {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            buttons: Vec::new(),
            input: None,
            post_url: None,
            result: None,
            win: None,
        }
    }

    pub fn button(mut self, label: impl Into<String>) -> Self {
        self.buttons.push(FrameButton::post(label));
        self
    }

    pub fn input(mut self, text: impl Into<String>) -> Self {
        self.input = Some(FrameInput { text: text.into() });
        self
    }

    pub fn post_url(mut self, url: impl Into<String>) -> Self {
        self.post_url = Some(url.into());
        self
    }

    pub fn outcome(mut self, result: impl Into<String>, win: bool) -> Self {
        self.result = Some(result.into());
        self.win = Some(win);
        self
    }
}

// ============ Action bodies ============

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastId {
    pub fid: u64,
    pub hash: String,
}

/// Client-reported action fields; not authenticated
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntrustedData {
    pub fid: Option<u64>,
    pub url: Option<String>,
    pub message_hash: Option<String>,
    pub timestamp: Option<u64>,
    pub network: Option<u64>,
    pub button_index: Option<u32>,
    pub input_text: Option<String>,
    pub cast_id: Option<CastId>,
    pub state: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedData {
    /// Hex-encoded signed frame message
    pub message_bytes: Option<String>,
}

/// POST body sent by Farcaster clients on a button press
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameActionBody {
    pub untrusted_data: Option<UntrustedData>,
    pub trusted_data: Option<TrustedData>,
}

impl FrameActionBody {
    /// Typed bet text, `"0"` when absent
    pub fn input_text(&self) -> &str {
        self.untrusted_data
            .as_ref()
            .and_then(|d| d.input_text.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("0")
    }

    pub fn button_index(&self) -> Option<u32> {
        self.untrusted_data.as_ref().and_then(|d| d.button_index)
    }

    pub fn message_bytes(&self) -> Option<&str> {
        self.trusted_data
            .as_ref()
            .and_then(|d| d.message_bytes.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// `/api/flip` body: a bare `{ betAmount }` or a frame action
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlipRequest {
    pub bet_amount: Option<serde_json::Value>,
    pub untrusted_data: Option<UntrustedData>,
}

impl FlipRequest {
    /// Bet as typed; numbers are accepted as well as strings
    pub fn bet_text(&self) -> String {
        match &self.bet_amount {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(_) => String::new(),
            None => self
                .untrusted_data
                .as_ref()
                .and_then(|d| d.input_text.clone())
                .unwrap_or_default(),
        }
    }
}
