mod campaigns;
mod health;

pub use campaigns::{
    download_handler, status_handler, submit_handler, template_handler, ApiError, SubmitResponse,
};
pub use health::health_handler;
