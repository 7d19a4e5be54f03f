pub mod checkin;
pub mod staff;
pub mod ticket;
pub mod verification;

pub use checkin::{CheckinRecord, NewCheckin};
pub use staff::{Profile, Role, StaffAssignment};
pub use ticket::{Ticket, TicketStatus};
pub use verification::{
    CheckinStats, TicketSummary, VerifyOutcome, VerifyQrRequest, VerifyQrResponse,
};
