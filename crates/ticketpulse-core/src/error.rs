//! ticketpulse 핵심 에러 타입.
//!
//! 어댑터 crate는 외부 라이브러리 에러를 `map_err`로 `CoreError`에 매핑한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 설정, HTTP 호출, 입력 파싱 등 작업 전반의 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정값 오류 (필수 환경변수 누락 포함)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 네트워크 에러 (연결 실패, 타임아웃): 재시도 예산 소진 후
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 재시도 불가 또는 재시도 소진된 HTTP 응답
    #[error("HTTP 에러 ({status}): {body}")]
    Http {
        /// 응답 상태 코드
        status: u16,
        /// 응답 본문 (운영자 확인용)
        body: String,
    },

    /// 응답/입력 파싱 실패
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// HTTP 상태 코드 (HTTP 에러인 경우)
    pub fn status(&self) -> Option<u16> {
        match self {
            CoreError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
