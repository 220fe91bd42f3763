extern "C" {
    // system calls

    // Terminate the current process; status reported to wait(). No return.
    pub fn exit(status: i32) -> !;

    // Return the current process's PID.
    pub fn getpid() -> i32;

    // Create a process, return child's PID.
    pub fn fork() -> i32;

    // Wait for a child to exit; exit status in *status; returns child PID.
    pub fn wait(addr: *const u8) -> i32;

    // Read n bytes into buf; returns number read; or 0 if end of file.
    pub fn read(fd: i32, addr: *mut u8, n: i32) -> i32;

    // Write n bytes from buf to file descriptor fd; returns n.
    pub fn write(fd: i32, addr: *const u8, n: i32) -> i32;

    // Open a file; flags indicate read/write; returns an fd (file descriptor).
    pub fn open(path: *const u8, omode: i32) -> i32;

    // Release open file fd.
    pub fn close(fd: i32) -> i32;

    // Load a file and execute it with arguments; only returns if error.
    pub fn exec(path: *const u8, argv: *const *const u8) -> i32;

    // Grow process's memory by n bytes (may be negative). Returns old size.
    pub fn sbrk(n: i32) -> *mut u8;

    // Pause for n clock ticks.
    pub fn sleep(n: i32) -> i32;

    // Place info about an open file into *st.
    pub fn fstat(fd: i32, st: *mut u8) -> i32;

    // Remove a file.
    pub fn unlink(path: *const u8) -> i32;

    // Create a new directory.
    pub fn mkdir(path: *const u8) -> i32;
}
