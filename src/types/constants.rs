/// Wire frame type strings (magic strings layer)
pub mod frame_types {
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
    pub const JOIN_ROOM: &str = "join_room";
    pub const LEAVE_ROOM: &str = "leave_room";
    pub const USER_TYPING: &str = "user_typing";
    pub const USER_STOPPED_TYPING: &str = "user_stopped_typing";
    pub const CHAT_MESSAGE: &str = "chat_message";
    pub const MEDIA_STATE_CHANGE: &str = "media_state_change";
    pub const HAND_RAISE: &str = "hand_raise";
    pub const UPDATE_STATUS: &str = "update_status";
    pub const KICK: &str = "kick";
    pub const WEBRTC_OFFER: &str = "webrtc_offer";
    pub const WEBRTC_ANSWER: &str = "webrtc_answer";
    pub const WEBRTC_ICE_CANDIDATE: &str = "webrtc_ice_candidate";
    pub const CONNECTION_SUCCESS: &str = "connection_success";
    pub const USER_JOINED: &str = "user_joined";
    pub const USER_LEFT: &str = "user_left";
    pub const NOTIFICATION: &str = "notification";
    pub const ERROR: &str = "error";
    pub const AUTH_WARNING: &str = "auth_warning";
}

/// Path segment appended to the base endpoint for the realtime socket
pub const REALTIME_PATH: &str = "realtime";

/// Default heartbeat interval (milliseconds)
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 25_000;

/// Reconnect backoff defaults (milliseconds)
pub const DEFAULT_RECONNECT_BASE_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_CAP_MS: u64 = 30_000;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Upper bound of the random jitter added to each reconnect delay (milliseconds)
pub const RECONNECT_JITTER_MS: u64 = 1_000;

/// Max outbound queue size while disconnected
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Credential lifetime below which a renewal is triggered before use (seconds)
pub const DEFAULT_RENEWAL_BUFFER_SECS: u64 = 60;

/// How long before credential expiry the idle-renewal timer fires (seconds)
pub const DEFAULT_EXPIRY_LEAD_SECS: u64 = 300;

/// Local typing debounce: inactivity window before a stop frame is sent (milliseconds)
pub const DEFAULT_TYPING_DEBOUNCE_MS: u64 = 1_000;

/// Remote typing entries expire this long after the last typing frame (milliseconds)
pub const DEFAULT_TYPING_EXPIRY_MS: u64 = 3_000;

/// Sweep interval for expired typing entries (milliseconds)
pub const TYPING_SWEEP_INTERVAL_MS: u64 = 500;

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;

/// Reserved close-code range signalling an authentication failure, as opposed
/// to a generic abnormal closure. Closes in this range get one credential
/// renewal attempt instead of the backoff loop.
pub const AUTH_CLOSE_CODE_MIN: u16 = 4001;
pub const AUTH_CLOSE_CODE_MAX: u16 = 4003;

/// Whether a close code falls in the reserved authentication-failure range
pub fn is_auth_close(code: u16) -> bool {
    (AUTH_CLOSE_CODE_MIN..=AUTH_CLOSE_CODE_MAX).contains(&code)
}
