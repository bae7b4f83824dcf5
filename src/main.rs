#[tokio::main]
async fn main() {
    if let Err(e) = clinic_scheduler::run().await {
        eprintln!("clinic-scheduler: {e}");
        std::process::exit(1);
    }
}
