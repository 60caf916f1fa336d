/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const SCHEDULE_ROUTE_COMPONENT: &str = "schedule";
pub const SCHEDULE_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", SCHEDULE_ROUTE_COMPONENT);

pub const MEETINGS_ROUTE_COMPONENT: &str = "meetings";
pub const MEETINGS_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", MEETINGS_ROUTE_COMPONENT);

/// Header carrying the chat user id of the requester.
pub const USER_HEADER: &str = "x-kunai-user";

/// Title used when a request names no meeting.
pub const PLACEHOLDER_TITLE: &str = "Meeting";
