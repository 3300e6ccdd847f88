//! # Example: basic_sequence
//!
//! Minimal example of a forward traversal over three synchronous stages.
//!
//! Demonstrates how to:
//! - Define stages using [`StageFn`].
//! - Observe the runner's lifecycle channels.
//! - Run a traversal to `Finish`.
//!
//! ## Flow
//! ```text
//! start_forward()
//!     ├─► BeforeItemProcess(fetch) ─► ItemProcessed(fetch)
//!     ├─► BeforeItemProcess(parse) ─► ItemProcessed(parse)
//!     ├─► BeforeItemProcess(store) ─► ItemProcessed(store)
//!     └─► Finish
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_sequence
//! ```

use std::sync::Arc;

use signalbus::{
    BEFORE_ITEM_PROCESS, FINISH, ITEM_PROCESSED, Progress, SequenceRunner, Signal, StageFn,
    StageRef,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Three stages that complete inside their own invoke call
    let stages: Vec<StageRef> = ["fetch", "parse", "store"]
        .iter()
        .map(|name| {
            StageFn::new(*name)
                .on("run", |emitter| {
                    emitter.emit("Done");
                    Ok(())
                })
                .arc()
        })
        .collect();

    // 2. Runner invoking "run" per stage, waiting for each stage's "Done"
    let runner = SequenceRunner::new(stages, "run", "Done");

    // 3. Observe the lifecycle channels
    for channel in [BEFORE_ITEM_PROCESS, ITEM_PROCESSED, FINISH] {
        runner.emitter().subscribe(
            channel,
            Arc::new(|sig: &Signal| match sig.payload_as::<Progress>() {
                Some(p) => println!("[{}] stage={} index={}", sig.channel(), p.stage, p.index),
                None => println!("[{}]", sig.channel()),
            }),
        );
    }

    // 4. Traverse; everything completes synchronously, so this returns done
    runner.start_forward()?;
    assert!(!runner.is_running());
    Ok(())
}
