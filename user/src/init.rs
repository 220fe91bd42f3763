#![no_std]
#![feature(start)]

extern crate kernel;

use kernel::file::fcntl::O_RDWR;
use ulib::printf;
use ulib::stubs::{exit, fork, open, wait};

// The first user-mode process. The kernel's boot path already creates the
// "console" device inode (see mkconsoledev in the kernel's syscall layer),
// so init just needs to open it three times for fds 0/1/2 -- there is no
// dup system call in this build.
#[start]
fn main(_argc: isize, _argv: *const *const u8) -> isize {
    unsafe {
        for _ in 0..3 {
            open("console\0" as *const str as *const u8, O_RDWR);
        }

        printf!("init: starting\n");

        loop {
            let pid = fork();
            if pid < 0 {
                printf!("init: fork failed\n");
                exit(1);
            }
            if pid == 0 {
                printf!("hi\n");
                exit(0);
            }

            loop {
                let wpid = wait(0 as *const u8);
                if wpid == pid {
                    break;
                } else if wpid < 0 {
                    // no children left; wait for the next fork.
                    break;
                }
            }
        }
    }
}
