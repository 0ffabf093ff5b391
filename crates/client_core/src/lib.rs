pub mod config;
pub mod error;
pub mod preview;
pub mod session;
pub mod transport;
pub mod workflow;

pub use config::{load_settings, ClientSettings};
pub use error::ClassifyError;
pub use preview::{ImagePreviewAllocator, PreviewAllocator, PreviewHandle};
pub use session::ClassificationSession;
pub use transport::{Classifier, HttpClassifier};
pub use workflow::{
    ClassificationWorkflow, Failure, RejectedSelection, ResponseOutcome, Selection,
    SubmissionStatus, SubmissionTicket, WorkflowPhase, WorkflowState,
};
