//! Document renderer seam.
//!
//! Rendering itself (rasterizing a PDF page onto a surface) is outside
//! this crate; the session controller only needs to open a document and
//! learn its page count. The handle doubles as the resource to release
//! when the session closes.

/// Renderer failure while opening a document.
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("document load failed: {0}")]
    Load(String),
}

/// Opens documents by URL.
#[async_trait::async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn open(&self, url: &str) -> Result<Box<dyn DocumentHandle>, RendererError>;
}

/// An open document. Dropped when the session closes.
pub trait DocumentHandle: Send + Sync {
    /// Total page count, once the load has progressed far enough to know
    /// it. `None` means the document is still loading.
    fn page_count(&self) -> Option<u32>;
}

/// Scriptable renderer for tests: reports a fixed page count, a
/// still-loading document, or a load failure.
pub struct MockRenderer {
    outcome: MockOutcome,
}

enum MockOutcome {
    Pages(u32),
    StillLoading,
    Fail(String),
}

impl MockRenderer {
    /// A renderer whose documents report `pages` immediately.
    pub fn with_page_count(pages: u32) -> Self {
        Self {
            outcome: MockOutcome::Pages(pages),
        }
    }

    /// A renderer whose documents open but never finish counting pages.
    pub fn still_loading() -> Self {
        Self {
            outcome: MockOutcome::StillLoading,
        }
    }

    /// A renderer that fails to open anything.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: MockOutcome::Fail(reason.into()),
        }
    }
}

struct MockHandle {
    page_count: Option<u32>,
}

impl DocumentHandle for MockHandle {
    fn page_count(&self) -> Option<u32> {
        self.page_count
    }
}

#[async_trait::async_trait]
impl DocumentRenderer for MockRenderer {
    async fn open(&self, _url: &str) -> Result<Box<dyn DocumentHandle>, RendererError> {
        match &self.outcome {
            MockOutcome::Pages(pages) => Ok(Box::new(MockHandle {
                page_count: Some(*pages),
            })),
            MockOutcome::StillLoading => Ok(Box::new(MockHandle { page_count: None })),
            MockOutcome::Fail(reason) => Err(RendererError::Load(reason.clone())),
        }
    }
}
