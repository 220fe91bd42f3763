use core::mem;

use crate::exec::exec;
use crate::file::fcntl::{O_CREATE, O_RDONLY, O_RDWR, O_TRUNC, O_WRONLY};
use crate::file::file::{fileclose, filealloc, fileread, filestat, filewrite};
use crate::file::FDType::{FD_DEVICE, FD_INODE};
use crate::file::{CONSOLE, File, INode};
use crate::fs::fs::{dirlink, dirlookup, ialloc, namei, nameiparent};
use crate::fs::{Dirent, DIRSIZ};
use crate::fslog::{begin_op, end_op};
use crate::kalloc::KMEM;
use crate::param::{MAXARG, MAXPATH, NDEV, NOFILE};
use crate::proc::myproc;
use crate::riscv::PGSIZE;
use crate::stat::FileType;
use crate::stat::FileType::{T_DEVICE, T_DIR, T_FILE};
use crate::syscall::syscall::{argaddr, argint, argstr, fetchaddr, fetchstr};

pub(crate) fn sys_exec() -> u64 {
    let mut uarg: usize = 0;
    let uargv = argaddr(1);

    let mut path: [u8; MAXPATH] = ['\0' as u8; MAXPATH];
    if argstr(0, &mut path as *mut u8, MAXPATH) < 0 {
        return u64::MAX;
    }

    let mut argv: [Option<*mut u8>; MAXARG] = [None; MAXARG];
    let mut i = 0;
    let mut bad = false;
    loop {
        if i >= argv.len() {
            bad = true;
            break;
        }

        if fetchaddr(uargv + mem::size_of::<usize>() * i, &mut uarg) < 0 {
            bad = true;
            break;
        }

        if uarg == 0 {
            argv[i] = None;
            break;
        }

        let ptr: *mut u8 = unsafe { KMEM.kalloc() };
        if ptr.is_null() {
            bad = true;
            break;
        }
        argv[i] = Some(ptr);

        if fetchstr(uarg, argv[i].unwrap(), PGSIZE) < 0 {
            bad = true;
            break;
        }

        i += 1;
    }

    let mut ret = -1;
    if !bad {
        ret = exec(&path, &argv);
    }

    for i in 0..argv.len() {
        if argv[i].is_none() {
            break;
        }

        unsafe { KMEM.kfree(argv[i].unwrap()) }
    }

    return ret as u64;
}

pub(crate) fn sys_open() -> u64 {
    let mut path: [u8; MAXPATH] = ['\0' as u8; MAXPATH];
    let omode = argint(1);
    let n = argstr(0, &mut path as *mut u8, MAXPATH);
    if n < 0 {
        return u64::MAX;
    }

    begin_op();

    let path_str = unsafe { core::str::from_utf8_unchecked(&path[..n as usize]) };

    let ip: Option<&mut INode> = if omode & O_CREATE != 0 {
        create(path_str, T_FILE, 0, 0)
    } else {
        match namei(path_str) {
            None => None,
            Some(ip) => {
                ip.ilock();
                if ip.file_type == T_DIR && omode != O_RDONLY {
                    ip.iunlockput();
                    None
                } else {
                    Some(ip)
                }
            }
        }
    };

    let ip = match ip {
        Some(ip) => ip,
        None => {
            end_op();
            return u64::MAX;
        }
    };

    if ip.file_type == T_DEVICE && (ip.major < 0 || ip.major as usize >= NDEV) {
        ip.iunlockput();
        end_op();
        return u64::MAX;
    }

    let f = match filealloc() {
        Some(f) => f,
        None => {
            ip.iunlockput();
            end_op();
            return u64::MAX;
        }
    };

    let fd = match fdalloc(f as *mut File) {
        Some(fd) => fd,
        None => {
            fileclose(f);
            ip.iunlockput();
            end_op();
            return u64::MAX;
        }
    };

    if ip.file_type == T_DEVICE {
        f.file_type = FD_DEVICE;
        f.major = ip.major;
    } else {
        f.file_type = FD_INODE;
        f.off = 0;
    }
    f.readable = omode & O_WRONLY == 0;
    f.writable = (omode & O_WRONLY) != 0 || (omode & O_RDWR) != 0;

    if (omode & O_TRUNC) != 0 && ip.file_type == T_FILE {
        ip.itrunc();
    }

    f.ip = Some(ip as *mut INode);

    ip.iunlock();
    end_op();

    return fd as u64;
}

pub(crate) fn sys_close() -> u64 {
    let fd = argint(0);
    if fd < 0 || fd as usize >= NOFILE {
        return u64::MAX;
    }

    let p = myproc();
    let f = match p.ofile[fd as usize] {
        Some(f) => f,
        None => return u64::MAX,
    };
    p.ofile[fd as usize] = None;
    fileclose(unsafe { &mut *f });

    0
}

pub(crate) fn sys_read() -> u64 {
    let (_, f) = match argfd(0) {
        Some(x) => x,
        None => return u64::MAX,
    };
    let addr = argaddr(1);
    let n = argint(2);
    if n < 0 {
        return u64::MAX;
    }

    fileread(f, addr, n as usize) as i64 as u64
}

pub(crate) fn sys_write() -> u64 {
    let (_, f) = match argfd(0) {
        Some(x) => x,
        None => return u64::MAX,
    };
    let addr = argaddr(1);
    let n = argint(2);
    if n < 0 {
        return u64::MAX;
    }

    filewrite(f, addr, n as usize) as i64 as u64
}

pub(crate) fn sys_fstat() -> u64 {
    let (_, f) = match argfd(0) {
        Some(x) => x,
        None => return u64::MAX,
    };
    let addr = argaddr(1);

    filestat(f, addr) as i64 as u64
}

pub(crate) fn sys_mkdir() -> u64 {
    begin_op();

    let mut path: [u8; MAXPATH] = [0; MAXPATH];
    if argstr(0, &mut path as *mut u8, MAXPATH) < 0 {
        end_op();
        return u64::MAX;
    }

    let path_str = unsafe { core::str::from_utf8_unchecked(&path) };
    match create(path_str, T_DIR, 0, 0) {
        Some(ip) => {
            ip.iunlockput();
            end_op();
            0
        }
        None => {
            end_op();
            u64::MAX
        }
    }
}

pub(crate) fn sys_unlink() -> u64 {
    let mut path: [u8; MAXPATH] = [0; MAXPATH];
    if argstr(0, &mut path as *mut u8, MAXPATH) < 0 {
        return u64::MAX;
    }
    let path_str = unsafe { core::str::from_utf8_unchecked(&path) };

    begin_op();

    let (dp_opt, name) = nameiparent(path_str);
    let dp = match dp_opt {
        Some(dp) => dp,
        None => {
            end_op();
            return u64::MAX;
        }
    };
    dp.ilock();

    // cannot unlink "." or ".."
    if name == b"." || name == b".." {
        dp.iunlockput();
        end_op();
        return u64::MAX;
    }

    let mut off = 0u32;
    let ip = match dirlookup(dp, name, &mut off) {
        Some(ip) => ip,
        None => {
            dp.iunlockput();
            end_op();
            return u64::MAX;
        }
    };
    ip.ilock();

    if ip.nlink < 1 {
        panic!("sys_unlink: nlink < 1");
    }
    if ip.file_type == T_DIR && !dir_is_empty(ip) {
        ip.iunlockput();
        dp.iunlockput();
        end_op();
        return u64::MAX;
    }

    let de = Dirent {
        inum: 0,
        name: [0; DIRSIZ],
    };
    if dp.writei(
        false,
        &de as *const Dirent as *mut Dirent,
        off,
        mem::size_of::<Dirent>(),
    ) != mem::size_of::<Dirent>() as isize
    {
        panic!("sys_unlink: writei");
    }

    if ip.file_type == T_DIR {
        dp.nlink -= 1;
        dp.iupdate();
    }
    dp.iunlockput();

    ip.nlink -= 1;
    ip.iupdate();
    ip.iunlockput();

    end_op();
    0
}

// True if dp (a directory) contains nothing but "." and "..".
fn dir_is_empty(dp: &mut INode) -> bool {
    let sz = mem::size_of::<Dirent>();
    let mut de = Dirent {
        inum: 0,
        name: [0; DIRSIZ],
    };
    let mut off = (2 * sz) as u32; // skip "." and ".."
    while off < dp.size {
        if dp.readi(false, &mut de as *mut Dirent, off, sz) != sz {
            panic!("dir_is_empty: readi");
        }
        if de.inum != 0 {
            return false;
        }
        off += sz as u32;
    }
    true
}

// Creates the console device node the very first time the filesystem is
// mounted. Classic xv6 populates this via a one-off mknod() call from
// init; here it's the kernel's own bootstrap that gives init a "console"
// to open, since there is no mknod system call in this build.
pub(crate) fn mkconsoledev() {
    begin_op();
    match namei("console") {
        Some(ip) => ip.iput(),
        None => {
            if let Some(ip) = create("console", T_DEVICE, CONSOLE as i16, 0) {
                ip.iunlockput();
            }
        }
    }
    end_op();
}

fn create<'a>(path: &str, file_type: FileType, major: i16, minor: i16) -> Option<&'a mut INode> {
    let (dp_opt, name) = nameiparent(path);
    let dp = dp_opt?;
    dp.ilock();

    let ip = dirlookup(dp, name, &mut 0);
    if ip.is_some() {
        let ip = ip?;
        dp.iunlockput();
        ip.ilock();
        if file_type == T_FILE && (ip.file_type == T_FILE || ip.file_type == T_DEVICE) {
            return Some(ip);
        }
        ip.iunlockput();
        return None;
    }

    let ip = ialloc(dp.dev, file_type);
    if ip.is_none() {
        dp.iunlockput();
        return None;
    }

    let ip = ip?;
    ip.ilock();
    ip.major = major;
    ip.minor = minor;
    ip.nlink = 1;
    ip.iupdate();

    if file_type == T_DIR {
        // No ip->nlink++ for ".": avoid cyclic ref count.
        if dirlink(ip, b".", ip.inum as u16).is_none()
            || dirlink(ip, b"..", dp.inum as u16).is_none()
        {
            ip.nlink = 0;
            ip.iupdate();
            ip.iunlockput();
            dp.iunlockput();
            return None;
        }
    }

    if dirlink(dp, name, ip.inum as u16).is_none() {
        ip.nlink = 0;
        ip.iupdate();
        ip.iunlockput();
        dp.iunlockput();
        return None;
    }

    if file_type == T_DIR {
        // now that success is guaranteed:
        dp.nlink += 1; // for ".."
        ip.iupdate();
    }

    dp.iunlockput();

    return Some(ip);
}

// Allocate a file descriptor for the given file.
// Takes over file reference from caller on success.
fn fdalloc(f: *mut File) -> Option<usize> {
    let p = myproc();

    for fd in 0..NOFILE {
        if p.ofile[fd].is_none() {
            p.ofile[fd] = Some(f);
            return Some(fd);
        }
    }

    return None;
}

// Fetch the nth word-sized system call argument as a file descriptor
// and return both its number and the File it names.
fn argfd(n: u8) -> Option<(i32, &'static mut File<'static>)> {
    let fd = argint(n);
    if fd < 0 || fd as usize >= NOFILE {
        return None;
    }

    let p = myproc();
    let f = p.ofile[fd as usize]?;
    Some((fd, unsafe { &mut *f }))
}
