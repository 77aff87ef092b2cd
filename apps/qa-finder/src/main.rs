//! Q&A Finder - Entry Point
//!
//! Minimal entry point that delegates to the app module.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    qa_finder::run().await
}
