mod attachment;
mod ticket;

pub use attachment::{StoredAttachment, UploadedFile};
pub use ticket::TicketResult;
