#![cfg_attr(not(test), no_std)]
#![no_main]
#![feature(panic_info_message)]
#![feature(strict_provenance)]
#![feature(const_mut_refs)]

extern crate alloc;

mod asm;
mod riscv;
mod memlayout;
mod param;
mod uart;
mod start;
mod spinlock;
mod sleeplock;
mod proc;
mod console;
mod printf;
mod kalloc;
mod string;
mod vm;
mod trap;
mod plic;
mod buf;
mod bio;
mod fs;
mod file;
mod stat;
mod virtio;
mod elf;
mod exec;
mod syscall;
mod logger;

mod fslog;

use core::alloc::{GlobalAlloc, Layout};
use core::sync::atomic::{AtomicBool, Ordering};
use crate::kalloc::KMem;
use crate::printf::Printer;
use crate::proc::cpuid;
use crate::riscv::__sync_synchronize;

// ///////////////////////////////////
// / LANGUAGE STRUCTURES / FUNCTIONS
// ///////////////////////////////////
#[no_mangle]
extern "C" fn eh_personality() {}
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    printf!("Aborting: \n");
    if let Some(p) = info.location() {
        printf!(
            "line {}, file {}: {}\n",
            p.line(),
            p.file(),
            info.message().unwrap()
        );
    }
    else {
        printf!("no information available.\n");
    }
    abort();
}

#[no_mangle]
extern "C"
fn abort() -> ! {
    loop {
        unsafe {
            core::arch::asm!("wfi")
        }
    }
}

struct NoopAllocator{}
unsafe impl Sync for NoopAllocator {}
unsafe impl GlobalAlloc for NoopAllocator {
    unsafe fn alloc(&self, _layout: Layout) -> *mut u8 {
        todo!()
    }

    unsafe fn dealloc(&self, _ptr: *mut u8, _layout: Layout) {
        todo!()
    }
}
#[global_allocator]
static ALLOCATOR: NoopAllocator = NoopAllocator{};

static STARTED: AtomicBool = AtomicBool::new(false);

#[no_mangle]
pub extern "C" fn kmain() {
    if cpuid() == 0 {
        Printer::init();
        let _ = logger::init(log::LevelFilter::Info);
        printf!("\nxv6 kernel is booting...\n\n");

        KMem::kinit(); // physical page allocator
        log::info!("Kernel memory initialized.");

        vm::kvminit(); // create kernel page table
        log::info!("Virtual memory initialized.");

        vm::kvminithart(); // turn on paging
        log::info!("Paging turned on.");

        proc::procinit(); // process table
        log::info!("Processes initialized");

        trap::trapinit(); // trap vectors
        trap::trapinithart(); // install kernel trap vector
        log::info!("Trap initialized");

        plic::plicinit(); // set up interrupt controller
        plic::plicinithart(); // ask PLIC for device interrupts
        log::info!("Plic initialized");

        bio::binit(); // buffer cache
        log::info!("Buffer cache initialized");

        fs::fs::iinit(); // inode table
        file::file::fileinit(); // file table
        log::info!("ITable FTable initialized");

        virtio::virtio_disk::virtio_disk_init(); // emulated hard disk
        log::info!("VirtIO disk initialized");

        proc::userinit(); // first user process
        log::info!("First user process initialized");

        __sync_synchronize();
        STARTED.store(true, Ordering::Relaxed);
        printf!("\nSystem boot successful\n")
    } else {
        while !STARTED.load(Ordering::Relaxed) {}

        __sync_synchronize();
        printf!("hart {} starting\n", cpuid());
        vm::kvminithart();    // turn on paging
        trap::trapinithart();   // install kernel trap vector
        plic::plicinithart();    // ask PLIC for device interrupts
    }

    proc::scheduler();
}