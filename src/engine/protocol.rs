//! Messages exchanged with the rendering engine
//!
//! The engine runs in a worker and answers one request at a time. Every
//! request carries a `RequestTag`; the response echoes it, which is how stale
//! answers are told apart from current ones.

use crate::models::{BreakPolicy, ExpansionAliasMap, PageBreakMap, Timemap};
use crate::navigation::PageTurnRequest;
use serde::{Deserialize, Serialize};

/// Request context at submission time
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestTag {
    pub generation: u64,
    pub markup_version: u64,
    pub page: u32,
    pub policy: BreakPolicy,
}

/// Independent request streams; each keeps its own latest generation
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Render,
    ElementPage,
    Timemap,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::Render => "render",
            Channel::ElementPage => "element page",
            Channel::Timemap => "timemap",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum RenderRequest {
    /// Full load of a new document
    UpdateAll {
        tag: RequestTag,
        markup: String,
        speed_mode: bool,
    },
    /// Re-render after an edit, staying on the current page
    UpdateData {
        tag: RequestTag,
        markup: String,
        speed_mode: bool,
    },
    /// Show another page; `markup` is the page slice in speed mode
    UpdatePage {
        tag: RequestTag,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        markup: Option<String>,
    },
    /// Show another page and continue a keyboard navigation there
    NavigatePage {
        tag: RequestTag,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        markup: Option<String>,
        turn: PageTurnRequest,
    },
    /// Full (non-speed) layout pass producing the page-break map
    ComputePageBreaks { tag: RequestTag, markup: String },
    QueryElementPage { tag: RequestTag, id: String },
    ComputeTimemap {
        tag: RequestTag,
        markup: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expansion: Option<String>,
    },
}

impl RenderRequest {
    pub fn tag(&self) -> RequestTag {
        match self {
            RenderRequest::UpdateAll { tag, .. }
            | RenderRequest::UpdateData { tag, .. }
            | RenderRequest::UpdatePage { tag, .. }
            | RenderRequest::NavigatePage { tag, .. }
            | RenderRequest::ComputePageBreaks { tag, .. }
            | RenderRequest::QueryElementPage { tag, .. }
            | RenderRequest::ComputeTimemap { tag, .. } => *tag,
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            RenderRequest::QueryElementPage { .. } => Channel::ElementPage,
            RenderRequest::ComputeTimemap { .. } => Channel::Timemap,
            _ => Channel::Render,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum RenderResponse {
    Rendered {
        tag: RequestTag,
        svg: String,
        /// Reported by the engine when it laid out the whole document
        #[serde(default)]
        page_count: Option<u32>,
    },
    PageBreaks {
        tag: RequestTag,
        page_break_map: PageBreakMap,
    },
    ElementPage {
        tag: RequestTag,
        id: String,
        /// `None` when the engine does not know the element
        #[serde(default)]
        page: Option<u32>,
    },
    Timemap {
        tag: RequestTag,
        timemap: Timemap,
        #[serde(default)]
        aliases: Option<ExpansionAliasMap>,
    },
    Error {
        tag: RequestTag,
        channel: Channel,
        message: String,
    },
}

impl RenderResponse {
    pub fn tag(&self) -> RequestTag {
        match self {
            RenderResponse::Rendered { tag, .. }
            | RenderResponse::PageBreaks { tag, .. }
            | RenderResponse::ElementPage { tag, .. }
            | RenderResponse::Timemap { tag, .. }
            | RenderResponse::Error { tag, .. } => *tag,
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            RenderResponse::ElementPage { .. } => Channel::ElementPage,
            RenderResponse::Timemap { .. } => Channel::Timemap,
            RenderResponse::Error { channel, .. } => *channel,
            _ => Channel::Render,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag() -> RequestTag {
        RequestTag {
            generation: 3,
            markup_version: 2,
            page: 1,
            policy: BreakPolicy::Line,
        }
    }

    #[test]
    fn test_request_wire_shape() {
        let req = RenderRequest::QueryElementPage { tag: tag(), id: "n1".into() };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["cmd"], "query_element_page");
        assert_eq!(json["tag"]["markupVersion"], 2);
        assert_eq!(json["tag"]["policy"], "line");
        assert_eq!(req.channel(), Channel::ElementPage);
    }

    #[test]
    fn test_response_from_worker_json() {
        let json = r#"{"cmd":"timemap","tag":{"generation":1,"markupVersion":1,"page":1,"policy":"auto"},
                       "timemap":[{"tstamp":0,"on":["n1"]},{"tstamp":250,"off":["n1"]}]}"#;
        let resp: RenderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.channel(), Channel::Timemap);
        match resp {
            RenderResponse::Timemap { timemap, aliases, .. } => {
                assert_eq!(timemap.len(), 2);
                assert!(aliases.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
