//! Pre-built `/proc` states.

use super::filesystem::MockFs;

/// Formats a `/proc/[pid]/stat` line with every column the kernel emits.
///
/// Only pid, comm, ppid, utime and stime carry meaningful values.
pub(crate) fn stat_line(pid: i32, comm: &str, ppid: i32, utime: u64, stime: u64) -> String {
    format!(
        "{pid} ({comm}) S {ppid} {pid} {pid} 0 -1 4194304 1200 0 3 0 {utime} {stime} 0 0 20 0 1 0 \
         4200 12345678 512 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0 0 0 0 0 0 0 0 0"
    )
}

fn status(name: &str, pid: i32, ppid: i32, vm_size_kb: u64) -> String {
    format!(
        "Name:\t{name}\nUmask:\t0022\nState:\tS (sleeping)\nTgid:\t{pid}\nPid:\t{pid}\nPPid:\t{ppid}\n\
         Uid:\t0\t0\t0\t0\nVmPeak:\t{vm_size_kb} kB\nVmSize:\t{vm_size_kb} kB\nVmRSS:\t    2048 kB\nThreads:\t1\n"
    )
}

impl MockFs {
    /// Four cores, 16 GB of memory, three processes.
    ///
    /// | pid  | name     | VmSize (kB) | utime+stime |
    /// |------|----------|-------------|-------------|
    /// | 1    | systemd  | 167936      | 230         |
    /// | 1000 | bash     | 4096000     | 50          |
    /// | 1001 | sshd     | 16384       | 8           |
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );

        fs.add_process(
            1,
            &status("systemd", 1, 0, 167936),
            &stat_line(1, "systemd", 0, 150, 80),
            "/sbin/init\0splash\0",
        );
        fs.add_process(
            1000,
            &status("bash", 1000, 1, 4096000),
            &stat_line(1000, "bash", 1, 30, 20),
            "-bash\0",
        );
        fs.add_process(
            1001,
            &status("sshd", 1001, 1, 16384),
            &stat_line(1001, "sshd", 1, 5, 3),
            "sshd: /usr/sbin/sshd -D [listener]\0",
        );

        // Non-process entries that live next to pid directories.
        fs.add_dir("/proc/sys");
        fs.add_dir("/proc/self");

        fs
    }

    /// `typical_system` plus processes caught mid-teardown.
    ///
    /// - pid 2000: directory left behind, `status` already gone
    /// - pid 2001: `status` readable, `stat` and `cmdline` gone
    pub fn with_vanishing_processes() -> Self {
        let mut fs = Self::typical_system();
        fs.add_dir("/proc/2000");
        fs.add_process(2001, &status("worker", 2001, 1000, 8192), "", "");
        fs
    }
}
