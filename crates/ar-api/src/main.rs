#[tokio::main]
async fn main() {
    if let Err(err) = ar_api::run().await {
        tracing::error!(error = %err, "ar-api exited with error");
        eprintln!("ar-api: {err}");
        std::process::exit(1);
    }
}
