use core::mem::size_of;

use crate::file::FDType::{FD_DEVICE, FD_INODE, FD_NONE};
use crate::file::{CONSOLE, DEVSW, File};
use crate::fslog::{begin_op, end_op};
use crate::param::NFILE;
use crate::proc::{either_copyout, myproc};
use crate::spinlock::Spinlock;
use crate::stat::{FileType, Stat};

struct FTable {
    lock: Spinlock,
    file: [File; NFILE]
}

static mut FTABLE: FTable = FTable {
    lock: Spinlock::init_lock("ftable"),
    file: [File::create(); NFILE],
};

pub fn fileinit() {
    // empty due to FTABLE has already been initialized
}

// Allocate a file structure.
pub fn filealloc() -> Option<&'static mut File> {
    unsafe {
        FTABLE.lock.acquire();
        for f in &mut FTABLE.file {
            if f.ref_cnt == 0 {
                f.ref_cnt = 1;
                FTABLE.lock.release();
                return Some(f);
            }
        }

        FTABLE.lock.release();
        return None;
    }
}

// Increment ref count for file f.
pub(crate) fn filedup(f: *mut File) {
    unsafe {
        FTABLE.lock.acquire();
        let f = f.as_mut().unwrap();
        if f.ref_cnt < 1 {
            panic!("filedup")
        }

        f.ref_cnt += 1;
        FTABLE.lock.release();
    }
}

// Close file f.  (Decrement ref count, close when reaches 0.)
pub(crate) fn fileclose(f: &mut File) {
    unsafe {
        FTABLE.lock.acquire();
        if f.ref_cnt < 1 {
            panic!("fileclose");
        }

        f.ref_cnt -= 1;
        if f.ref_cnt > 0 {
            FTABLE.lock.release();
            return;
        }

        let file_type = f.file_type;
        let ip = f.ip;

        f.ref_cnt = 0;
        f.file_type = FD_NONE;
        FTABLE.lock.release();

        if file_type == FD_INODE || file_type == FD_DEVICE {
            begin_op();
            ip.unwrap().as_mut().unwrap().iput();
            end_op();
        }
    }
}

// Get metadata about file f.
// addr is a user virtual address, pointing to a struct stat.
pub(crate) fn filestat(f: &mut File, addr: usize) -> i32 {
    let p = myproc();
    match f.file_type {
        FD_INODE | FD_DEVICE => unsafe {
            let ip = f.ip.unwrap().as_mut().unwrap();
            ip.ilock();
            let st = Stat {
                dev: ip.dev as i32,
                ino: ip.inum,
                file_type: ip.file_type,
                nlink: ip.nlink,
                size: ip.size as usize,
            };
            ip.iunlock();
            if either_copyout(
                true,
                addr as *mut u8,
                &st as *const Stat as *const u8,
                size_of::<Stat>(),
            ) < 0
            {
                return -1;
            }
            0
        },
        _ => -1,
    }
}

// Read from file f.
pub(crate) fn fileread(f: &mut File, addr: usize, n: usize) -> i32 {
    if !f.readable {
        return -1;
    }

    match f.file_type {
        FD_DEVICE => {
            if f.major < 0 || f.major as usize >= crate::param::NDEV {
                return -1;
            }
            unsafe {
                match DEVSW[f.major as usize] {
                    Some(console) => (*console).read(true, addr, n) as i32,
                    None => -1,
                }
            }
        }
        FD_INODE => unsafe {
            let ip = f.ip.unwrap().as_mut().unwrap();
            ip.ilock();
            let r = ip.readi(true, addr as *mut u8, f.off, n);
            if r > 0 {
                f.off += r as u32;
            }
            ip.iunlock();
            r as i32
        },
        _ => panic!("fileread"),
    }
}

// Write to file f.
pub(crate) fn filewrite(f: &mut File, addr: usize, n: usize) -> i32 {
    if !f.writable {
        return -1;
    }

    match f.file_type {
        FD_DEVICE => {
            if f.major < 0 || f.major as usize >= crate::param::NDEV {
                return -1;
            }
            unsafe {
                match DEVSW[f.major as usize] {
                    Some(console) => (*console).write(true, addr, n) as i32,
                    None => -1,
                }
            }
        }
        FD_INODE => {
            // write a few blocks at a time to avoid exceeding the
            // maximum log transaction size, including i-node, indirect
            // block, allocation blocks, and 2 blocks of slop for
            // non-aligned writes.
            let max = ((crate::param::MAXOPBLOCKS - 1 - 1 - 2) / 2 * crate::fs::BSIZE as u32) as usize;
            let mut i = 0;
            let mut ret = 0;
            while i < n {
                let n1 = core::cmp::min(n - i, max);

                begin_op();
                let r = unsafe {
                    let ip = f.ip.unwrap().as_mut().unwrap();
                    ip.ilock();
                    let r = ip.writei(true, (addr + i) as *mut u8, f.off, n1);
                    if r > 0 {
                        f.off += r as u32;
                    }
                    ip.iunlock();
                    r
                };
                end_op();

                if r != n1 as isize {
                    // error from writei
                    break;
                }
                i += r as usize;
                ret = i;
            }

            if ret == n { ret as i32 } else { -1 }
        }
        _ => panic!("filewrite"),
    }
}
