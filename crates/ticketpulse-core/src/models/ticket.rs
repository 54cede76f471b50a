//! 티켓 API 레코드 모델.
//!
//! 외부 API 응답을 그대로 담는 읽기 전용 구조체. 타임스탬프는 원문 문자열로 보관하고
//! 집계 시점에 파싱한다 (파싱 실패 시 해당 티켓의 기여만 제외).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::time::parse_timestamp;

/// 티켓 상태 필터
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    /// 진행 중
    Open,
    /// 보류
    Hold,
    /// 종료
    Closed,
}

impl TicketState {
    /// API 쿼리 파라미터 값
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketState::Open => "open",
            TicketState::Hold => "hold",
            TicketState::Closed => "closed",
        }
    }

    /// 전체 상태 목록
    pub fn all() -> [TicketState; 3] {
        [TicketState::Open, TicketState::Hold, TicketState::Closed]
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 해결 시점 기준 타임스탬프
///
/// 윈도우 포함 여부, 해결 시간 종점, 월 버킷 모두 이 필드를 따른다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionAnchor {
    /// `updated_at` (티켓 종료 시 갱신됨)
    #[default]
    UpdatedAt,
    /// `closed_at`
    ClosedAt,
}

impl ResolutionAnchor {
    /// 필드 이름
    pub fn field_name(&self) -> &'static str {
        match self {
            ResolutionAnchor::UpdatedAt => "updated_at",
            ResolutionAnchor::ClosedAt => "closed_at",
        }
    }
}

/// 티켓 ID (숫자 또는 문자열)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TicketId {
    /// 숫자 ID
    Number(u64),
    /// 문자열 ID
    Text(String),
}

impl TicketId {
    /// JSON 값에서 ID 해석. 음수/실수는 문자열 ID로 보관한다.
    fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(match n.as_u64() {
                Some(id) => TicketId::Number(id),
                None => TicketId::Text(n.to_string()),
            }),
            serde_json::Value::String(s) => Some(TicketId::Text(s)),
            _ => None,
        }
    }
}

/// 태그 참조: 문자열 또는 `name` 필드를 가진 객체
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagRef {
    /// 태그 이름 문자열
    Plain(String),
    /// 태그 객체
    Named {
        /// 태그 이름
        #[serde(default)]
        name: Option<String>,
    },
    /// 인식할 수 없는 형태 (무시)
    Other(serde_json::Value),
}

impl TagRef {
    /// 태그 이름 (비어 있으면 `None`)
    pub fn name(&self) -> Option<&str> {
        let name = match self {
            TagRef::Plain(name) => Some(name.as_str()),
            TagRef::Named { name } => name.as_deref(),
            TagRef::Other(_) => None,
        };
        name.filter(|n| !n.is_empty())
    }
}

/// 티켓 레코드 (외부, 읽기 전용)
///
/// 필드 단위로 관대하게 역직렬화한다. 타입이 맞지 않는 필드는 `None`이 되고
/// 티켓 자체는 유지되므로 합계에는 포함된다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// 티켓 ID
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: Option<TicketId>,
    /// 상태 (`open`/`hold`/`closed`)
    #[serde(default, deserialize_with = "lenient::string")]
    pub state: Option<String>,
    /// 생성 시각
    #[serde(default, deserialize_with = "lenient::string")]
    pub created_at: Option<String>,
    /// 갱신 시각
    #[serde(default, deserialize_with = "lenient::string")]
    pub updated_at: Option<String>,
    /// 종료 시각
    #[serde(default, deserialize_with = "lenient::string")]
    pub closed_at: Option<String>,
    /// 태그/라벨 (목록이 아니면 `None`)
    #[serde(default, alias = "tags", deserialize_with = "lenient::labels")]
    pub labels: Option<Vec<TagRef>>,
}

/// 필드 단위 관대한 역직렬화
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{TagRef, TicketId};

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TicketId>, D::Error> {
        Ok(TicketId::from_json(Value::deserialize(d)?))
    }

    pub fn labels<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<TagRef>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .map(|item| {
                        serde_json::from_value(item.clone()).unwrap_or(TagRef::Other(item))
                    })
                    .collect(),
            ),
            _ => None,
        })
    }
}

impl Ticket {
    /// 종료 상태 여부
    pub fn is_closed(&self) -> bool {
        self.state.as_deref() == Some(TicketState::Closed.as_str())
    }

    /// 기준 타임스탬프 원문
    pub fn anchor_raw(&self, anchor: ResolutionAnchor) -> Option<&str> {
        match anchor {
            ResolutionAnchor::UpdatedAt => self.updated_at.as_deref(),
            ResolutionAnchor::ClosedAt => self.closed_at.as_deref(),
        }
    }

    /// 파싱된 기준 타임스탬프
    pub fn anchor_time(&self, anchor: ResolutionAnchor) -> Option<DateTime<Utc>> {
        self.anchor_raw(anchor).and_then(parse_timestamp)
    }

    /// 파싱된 생성 시각
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// 비어 있지 않은 태그 이름
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .flatten()
            .filter_map(|tag| tag.name())
    }
}
