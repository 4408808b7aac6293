use std::{
    process,
    ptr::{self, NonNull},
};

use argh::FromArgs;
use log::{debug, info};
use region_heap::{HEADER_SIZE, Heap};
use snafu::{ResultExt as _, Whatever, ensure_whatever};

mod logger;

/// Run allocator self-checks against a single fake heap region.
#[derive(Debug, FromArgs)]
struct Args {
    /// size of the region handed to the heap, in bytes
    #[argh(option, default = "4000")]
    region_size: usize,
    /// print the block chain after the checks
    #[argh(switch)]
    dump: bool,
    /// enable trace logging
    #[argh(switch, short = 'v')]
    verbose: bool,
}

fn main() {
    let args: Args = argh::from_env();

    if let Err(err) = run(&args) {
        let report = snafu::Report::from_error(err);
        eprintln!("{report}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Whatever> {
    logger::init(args.verbose).whatever_context("failed to install logger")?;

    let mut memory = vec![0_u8; args.region_size];
    let start = memory.as_mut_ptr();
    let mut heap = Heap::new();
    unsafe { heap.try_add_region(start, memory.len()) }.with_whatever_context(|_| {
        format!("failed to register region, size={}", args.region_size)
    })?;
    info!(
        "registered {} bytes at {start:p}, header is {HEADER_SIZE} bytes",
        args.region_size
    );

    let checks = run_checks(&mut heap, start, args.region_size);
    for check in &checks {
        println!("{:5} {}", check.passed, check.name);
    }

    if args.dump {
        for block in heap.blocks() {
            println!("{:#014x} {:>8} {}", block.addr, block.size, block.state);
        }
    }

    let stats = heap.stats();
    println!(
        "free: {} bytes, largest free block: {} bytes",
        stats.total_free, stats.largest_free
    );

    let failed = checks.iter().filter(|check| !check.passed).count();
    ensure_whatever!(failed == 0, "{failed} of {} checks failed", checks.len());
    Ok(())
}

struct Check {
    name: &'static str,
    passed: bool,
}

#[derive(Default)]
struct Checks(Vec<Check>);

impl Checks {
    fn record(&mut self, name: &'static str, passed: bool) {
        debug!("{name}: {passed}");
        self.0.push(Check { name, passed });
    }
}

fn raw(ptr: Option<NonNull<u8>>) -> *mut u8 {
    ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
}

fn run_checks(heap: &mut Heap, start: *mut u8, region_size: usize) -> Vec<Check> {
    let mut checks = Checks::default();
    let expected = start.wrapping_add(HEADER_SIZE);

    checks.record(
        "allocation larger than the region fails",
        heap.allocate(region_size).is_none(),
    );

    let first = raw(heap.allocate(5));
    checks.record("first allocation starts after the region header", first == expected);

    unsafe {
        heap.release(first);
        let again = raw(heap.allocate(5));
        checks.record("released block is reused at the same address", again == expected);

        let grown = raw(heap.reallocate(again, 6));
        checks.record("growing in place keeps the address", !grown.is_null() && grown == again);

        let shrunk = raw(heap.reallocate(grown, 5));
        checks.record("shrinking in place keeps the address", !shrunk.is_null() && shrunk == grown);

        let zeroed = raw(heap.allocate_zeroed(2, 3));
        checks.record("zeroed allocation succeeds", !zeroed.is_null());
        checks.record("zeroed allocation is a distinct block", zeroed != shrunk);

        heap.release(zeroed);
        heap.release(shrunk);
    }

    checks.0
}
