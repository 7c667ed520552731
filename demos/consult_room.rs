use std::sync::Arc;
use std::time::Duration;

use telecare_realtime::{
    Credential, HttpTokenProvider, SessionClient, SessionOptions, SignalingRelay,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let client = SessionClient::new(
        "wss://clinic.example.com/api",
        Credential::new(
            "your-access-token",
            Some("your-refresh-token".to_string()),
            Duration::from_secs(3600),
        ),
        Arc::new(HttpTokenProvider::new("https://clinic.example.com/auth/refresh")),
        SessionOptions {
            room_id: Some("consult-123".to_string()),
            ..Default::default()
        },
    )?;

    // Hold interest for the lifetime of the consult; dropping the handle
    // disconnects
    let _interest = client.acquire().await?;

    let room = client.room("consult-123", "user-1").await;
    room.join().await?;

    // Signaling payloads go straight to the media transport, unopened
    let relay = SignalingRelay::new(client.clone());
    let _signal = relay.on_signal(|frame| {
        println!("signal {} from {:?}", frame.kind, frame.from_user_id);
    });

    room.set_audio(true).await?;
    room.set_video(true).await?;

    loop {
        tokio::time::sleep(Duration::from_secs(5)).await;
        for participant in room.participants() {
            println!(
                "{} audio={} video={} hand={}",
                participant.user_id,
                participant.media.audio_enabled,
                participant.media.video_enabled,
                participant.hand_raised
            );
        }
        for user in room.typing_users() {
            println!("{user} is typing...");
        }
    }
}
