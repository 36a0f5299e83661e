//! Drives the simulated board through the typed commands.
//!
//! Usage:
//!   RUST_LOG=tmcl_core=debug cargo run --example simulated_board

use anyhow::Result;
use std::sync::Arc;
use std::thread;
use tmcl_core::board::{AXIS_ACTUAL_POSITION, AXIS_ACTUAL_SPEED};
use tmcl_core::demo::SimulatedBoard;
use tmcl_core::protocol::{Connection, ConnectionConfig, MoveMode};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let board = SimulatedBoard::new();
    let conn = Arc::new(Connection::with_opener(
        ConnectionConfig::new("simulated"),
        Arc::new(board.clone()),
    ));

    println!("Firmware: {}", conn.firmware_version()?);

    // One thread per axis; exchanges are serialized by the connection
    let workers: Vec<_> = (0..3u8)
        .map(|motor| {
            let conn = Arc::clone(&conn);
            thread::spawn(move || -> Result<i32> {
                conn.move_to(MoveMode::Absolute, motor, 1000 * i32::from(motor + 1))?;
                conn.move_to(MoveMode::Relative, motor, -250)?;
                conn.rotate_right(motor, 400)?;
                Ok(conn.get_axis_parameter(AXIS_ACTUAL_POSITION, motor)?)
            })
        })
        .collect();

    for (motor, worker) in workers.into_iter().enumerate() {
        let position = worker
            .join()
            .map_err(|_| anyhow::anyhow!("worker for motor {motor} panicked"))??;
        let speed = conn.get_axis_parameter(AXIS_ACTUAL_SPEED, motor as u8)?;
        println!("motor {motor}: position {position}, speed {speed}");
        conn.motor_stop(motor as u8)?;
    }

    board.corrupt_next_reply();
    match conn.motor_stop(0) {
        Ok(()) => println!("corrupted reply went unnoticed"),
        Err(e) => println!("corrupted reply rejected: {e}"),
    }

    println!("{} requests answered", board.requests().len());
    Ok(())
}
