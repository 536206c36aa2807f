//! Run summary printed after shutdown.

use pusher::{DrainOutcome, PusherReport};

/// Print detailed summary
pub fn print_summary(report: &PusherReport) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Pusher Statistics                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let dispatch = &report.dispatch;
    println!("📊 Overview");
    println!("   ├─ Uptime: {:.2}s", report.uptime.as_secs_f64());
    println!("   ├─ Shutdown reason: {}", report.reason);
    println!("   ├─ Drain: {}", describe_drain(&report.drain));
    println!("   ├─ Messages received: {}", dispatch.received);
    println!("   ├─ Handed to provider: {}", dispatch.dispatched);
    println!("   ├─ Rejected at send: {}", dispatch.rejected);
    println!("   └─ Runtime samples: {}", report.runtime_samples);

    let responses = &report.responses;
    println!("\n📈 Responses");
    println!(
        "   ├─ Total: {} ({:.2}% success)",
        responses.total_responses, responses.success_rate
    );
    println!("   ├─ Invalid tokens: {}", responses.invalid_tokens);
    println!("   ├─ Transient failures: {}", responses.transient_failures);
    println!("   └─ Latency (ms): {}", responses.latency_ms);

    println!("\n📤 Sink Deliveries");
    for (i, (name, snapshot)) in [
        ("feedback", &report.feedback),
        ("stats", &report.stats),
        ("invalid_token", &report.invalid_token),
    ]
    .into_iter()
    .enumerate()
    {
        let prefix = if i == 2 { "└─" } else { "├─" };
        println!(
            "   {} {}: {} delivered, {} failed",
            prefix, name, snapshot.delivered, snapshot.failed
        );
    }

    println!();
}

fn describe_drain(outcome: &DrainOutcome) -> String {
    match outcome {
        DrainOutcome::Clean => "clean".to_string(),
        DrainOutcome::TimedOut { remaining } => {
            format!("timed out with {remaining} send(s) in flight")
        }
        DrainOutcome::AlreadyDraining => "already draining".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_drain() {
        assert_eq!(describe_drain(&DrainOutcome::Clean), "clean");
        assert_eq!(
            describe_drain(&DrainOutcome::TimedOut { remaining: 2 }),
            "timed out with 2 send(s) in flight"
        );
    }
}
