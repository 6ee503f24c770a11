// Max JSON body size, in bytes. Report PDFs arrive base64-encoded
// inside the JSON body, so this is deliberately generous.
pub const MAX_BODY_SIZE: u64 = 25 * 1024 * 1024;

pub const DEFAULT_PORT: u16 = 8080;

// Bounded fan-out for defect notifications: at most this many
// concurrent SMTP connections per request.
pub const NOTIFY_CONCURRENCY: usize = 4;
