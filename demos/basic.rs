use std::sync::Arc;
use std::time::Duration;

use telecare_realtime::{
    Channel, Credential, Frame, FrameType, HttpTokenProvider, SessionClient, SessionOptions,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Create client
    let client = SessionClient::new(
        "wss://clinic.example.com/api",
        Credential::new(
            "your-access-token",
            Some("your-refresh-token".to_string()),
            Duration::from_secs(3600),
        ),
        Arc::new(HttpTokenProvider::new("https://clinic.example.com/auth/refresh")),
        SessionOptions::default(),
    )?;

    // Print chat messages and notifications as they arrive
    let _chat = client.subscribe(
        Channel::Chat,
        Arc::new(|frame| println!("chat: {}", frame.payload)),
    );
    let _toasts = client.subscribe(
        Channel::Notification,
        Arc::new(|frame| println!("notification: {}", frame.payload)),
    );

    // Connect
    println!("Connecting...");
    client.connect().await?;
    println!("Connected!");

    client
        .send(
            Frame::new(FrameType::ChatMessage)
                .with_payload(serde_json::json!({"text": "hello from the demo"})),
        )
        .await?;

    // Keep connection alive
    tokio::signal::ctrl_c().await?;

    // Disconnect
    println!("Disconnecting...");
    client.disconnect().await?;
    println!("Disconnected!");

    Ok(())
}
