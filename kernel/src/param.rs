// Compile-time kernel configuration.
//
// xv6 keeps these as #define constants in param.h; we keep the same
// names and values so the rest of the core reads exactly the way the
// spec and the teacher's modules reference them (`crate::param::NPROC`
// etc. throughout proc.rs, kalloc.rs, file.rs, bio.rs).

pub const NPROC: usize = 64; // maximum number of processes
pub const NCPU: usize = 1; // maximum number of CPUs (single-hart core)
pub const NOFILE: usize = 16; // open files per process
pub const NFILE: usize = 100; // open files per system
pub const NINODE: usize = 50; // maximum number of active i-nodes
pub const NDEV: usize = 10; // maximum major device number
pub const ROOTDEV: u32 = 1; // device number of file system root disk
pub const MAXARG: usize = 32; // max exec arguments
pub const MAXPATH: usize = 128; // maximum file path name
pub const MAXOPBLOCKS: u32 = 10; // max # of blocks any FS op writes
pub const LOGSIZE: usize = (MAXOPBLOCKS * 3) as usize; // max data blocks in on-disk log
pub const NBUF: usize = LOGSIZE + 2; // size of disk block cache

/// Number of timer ticks between two timer interrupts on this hart.
pub const TIMER_TICKS: u64 = 1_000_000;
