use std::fmt;

use binder_core::SkipReason;

use crate::binder::BindSummary;

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queued,
    Listing,
    FetchingChapters,
    Assembling,
    Writing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Queued => "queued",
            Stage::Listing => "listing",
            Stage::FetchingChapters => "fetching chapters",
            Stage::Assembling => "assembling",
            Stage::Writing => "writing",
            Stage::Done => "done",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: JobId,
    pub stage: Stage,
    /// Chapters processed so far, out of `chapters_total`.
    pub chapters_done: Option<usize>,
    pub chapters_total: Option<usize>,
    pub bytes: Option<u64>,
}

impl JobProgress {
    pub fn stage(job_id: JobId, stage: Stage) -> Self {
        Self {
            job_id,
            stage,
            chapters_done: None,
            chapters_total: None,
            bytes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(JobProgress),
    ChapterSkipped {
        job_id: JobId,
        sequence: u32,
        title: String,
        reason: SkipReason,
    },
    ImageFailed {
        job_id: JobId,
        sequence: u32,
        reference: String,
        message: String,
    },
    JobCompleted {
        job_id: JobId,
        result: Result<BindSummary, JobFailure>,
    },
}

/// Why a series could not be bound, flattened for transport over a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub stage: Stage,
    pub message: String,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (while {})", self.message, self.stage)
    }
}

/// Body of a successful request plus what the server said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    pub bytes: Vec<u8>,
    pub response: ResponseInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    pub requested_url: String,
    /// Where the body came from after redirects.
    pub final_url: String,
    pub redirects: usize,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct FetchError {
    pub kind: FetchFailure,
    pub detail: String,
}

impl FetchError {
    pub(crate) fn new(kind: FetchFailure, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    BadUrl,
    BadHeader,
    Status(u16),
    TimedOut,
    TooManyRedirects,
    /// `received` is the declared length, or the bytes read when the body
    /// crossed `limit` mid-stream.
    Oversized { limit: u64, received: u64 },
    RejectedContentType(String),
    Transport,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::BadUrl => f.write_str("bad url"),
            FetchFailure::BadHeader => f.write_str("bad request header"),
            FetchFailure::Status(code) => write!(f, "server answered {code}"),
            FetchFailure::TimedOut => f.write_str("timed out"),
            FetchFailure::TooManyRedirects => f.write_str("too many redirects"),
            FetchFailure::Oversized { limit, received } => {
                write!(f, "body over {limit} bytes ({received} seen)")
            }
            FetchFailure::RejectedContentType(content_type) => {
                write!(f, "content type {content_type} not accepted")
            }
            FetchFailure::Transport => f.write_str("transport error"),
        }
    }
}
