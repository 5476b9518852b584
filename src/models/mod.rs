pub mod email_log;
pub mod event;
pub mod location;
pub mod profile;
pub mod review;
pub mod rsvp;
pub mod tag;

pub use email_log::EmailLog;
pub use event::{
    Event, EventDetail, EventFilter, EventInput, EventList, EventPage, EventQuery, EventSort,
    EventStatus,
};
pub use location::{DanceStyle, Location};
pub use profile::{NewProfile, Profile, ProfileSummary, ProfileUpdate};
pub use review::{Review, ReviewInput, ReviewSummary, ReviewWithAuthor};
pub use rsvp::{EventRsvps, Rsvp, RsvpCounts, RsvpRequest, RsvpStatus, RsvpWithUser, UserRsvp};
pub use tag::{EventTagLink, Tag};
