//! Message handling between the overlay and the ranking engine.
//!
//! Requests mirror the overlay's actions. Tab-level actions are not
//! executed here: they come back as effects for the host to apply.

use crate::launcher::resolve_query;
use crate::rank::SuggestionRanker;
use omnijump_core::ScoredSuggestion;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetSearchSuggestions {
        query: String,
    },
    SearchOrNavigate {
        query: String,
    },
    CreateTab {
        url: String,
    },
    #[serde(rename_all = "camelCase")]
    SwitchToTab {
        tab_id: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Suggestions { suggestions: Vec<ScoredSuggestion> },
    Effect(Effect),
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "camelCase")]
pub enum Effect {
    OpenTab {
        url: String,
    },
    #[serde(rename_all = "camelCase")]
    ActivateTab {
        tab_id: i64,
    },
}

pub struct Dispatcher {
    ranker: SuggestionRanker,
}

impl Dispatcher {
    pub fn new(ranker: SuggestionRanker) -> Self {
        Self { ranker }
    }

    pub async fn handle(&self, req: Request) -> Response {
        match req {
            Request::GetSearchSuggestions { query } => {
                let query = query.trim();
                let suggestions = if query.is_empty() {
                    Vec::new()
                } else {
                    self.ranker.suggestions(query).await
                };
                Response::Suggestions { suggestions }
            }
            Request::SearchOrNavigate { query } => {
                let dest = resolve_query(&query, self.ranker.config());
                Response::Effect(Effect::OpenTab {
                    url: dest.url().to_string(),
                })
            }
            Request::CreateTab { url } => Response::Effect(Effect::OpenTab { url }),
            Request::SwitchToTab { tab_id } => Response::Effect(Effect::ActivateTab { tab_id }),
        }
    }

    /// Parse one JSON request line and answer it. Malformed input yields an error response.
    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(req) => self.handle(req).await,
            Err(e) => Response::Error {
                error: format!("invalid request: {e}"),
            },
        }
    }

    /// Serve JSON-lines requests from `reader` until EOF, one response line per request.
    ///
    /// A line that is not valid UTF-8 gets an error response; the loop keeps going.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let resp = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    self.handle_line(line).await
                }
                Err(e) => Response::Error {
                    error: format!("invalid request: line is not valid UTF-8 ({e})"),
                },
            };
            write_response(&mut writer, &resp).await?;
        }
        Ok(())
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    resp: &Response,
) -> std::io::Result<()> {
    let mut out = serde_json::to_vec(resp)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    out.push(b'\n');
    writer.write_all(&out).await?;
    writer.flush().await
}
