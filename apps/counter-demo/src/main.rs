use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fiber_app_shell::AppShell;
use fiber_core::{component, create_element, use_state, Element, Props};
use fiber_runtime_std::StdRuntime;

const DEFAULT_CLICKS: usize = 3;

fn counter(_: &Props) -> Element {
    let (state, set_state) = use_state(1);
    create_element(
        "h1",
        Props::new().on("click", move |_| set_state.update(|c| c + 1)),
        vec!["Count: ".into(), state.into()],
    )
}

fn count_wakes(runtime: &StdRuntime) -> Arc<AtomicUsize> {
    let wakes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&wakes);
    runtime.set_idle_waker(move || {
        let wake = counter.fetch_add(1, Ordering::Relaxed) + 1;
        log::trace!("idle callback requested ({wake})");
    });
    wakes
}

fn main() {
    env_logger::init();

    let clicks = match std::env::args().nth(1) {
        Some(arg) => match arg.parse::<usize>() {
            Ok(clicks) => clicks,
            Err(err) => {
                eprintln!("invalid click count {arg:?}: {err}");
                std::process::exit(2);
            }
        },
        None => DEFAULT_CLICKS,
    };

    println!("=== Fiber-RS Counter Example ===");
    println!("Renders <h1>Count: n</h1> and clicks it {clicks} times.");
    println!("Set RUST_LOG=debug to see passes and commits, trace for every unit of work.");
    println!();

    let mut shell = AppShell::headless(component(counter, Props::new()))
        .with_frame_budget(Duration::from_millis(8));
    let wakes = count_wakes(shell.runtime());

    shell.run_until_idle();
    print!("{}", shell.dump_tree());

    for click in 1..=clicks {
        if shell.dispatch("h1", "click") == 0 {
            log::error!("click {click} reached no listener");
            break;
        }
        let slices = shell.run_until_idle();
        log::info!("click {click} settled in {slices} slice(s)");
        print!("{}", shell.dump_tree());
    }

    shell.log_debug_info();
    println!();
    println!(
        "{} slices, {} idle callbacks requested",
        shell.slices(),
        wakes.load(Ordering::Relaxed)
    );
}
