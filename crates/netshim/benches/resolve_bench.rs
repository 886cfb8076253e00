use std::ffi::CString;
use std::ptr;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use netshim::{AddrInfoHints, getaddrinfo};

fn benchmark_numeric_resolution(c: &mut Criterion) {
    let hosts = ["127.0.0.1", "::1", "192.0.2.33"];
    let hints = AddrInfoHints::new().with_flags(libc::AI_NUMERICHOST | libc::AI_NUMERICSERV);
    let mut group = c.benchmark_group("numeric_resolution");

    for host in hosts {
        group.bench_with_input(BenchmarkId::new("netshim", host), &host, |b, &host| {
            b.iter(|| {
                let records = getaddrinfo(Some(black_box(host)), Some("443"), &hints);
                black_box(records).ok();
            });
        });

        let c_host = CString::new(host).unwrap();
        let c_service = CString::new("443").unwrap();
        group.bench_with_input(BenchmarkId::new("host_libc", host), &host, |b, &_host| {
            b.iter(|| {
                // SAFETY: zeroed addrinfo is a valid hints value.
                let mut raw_hints: libc::addrinfo = unsafe { std::mem::zeroed() };
                raw_hints.ai_flags = libc::AI_NUMERICHOST | libc::AI_NUMERICSERV;
                let mut res: *mut libc::addrinfo = ptr::null_mut();
                // SAFETY: NUL-terminated inputs, writable result pointer.
                let rc = unsafe {
                    libc::getaddrinfo(c_host.as_ptr(), c_service.as_ptr(), &raw_hints, &mut res)
                };
                if rc == 0 && !res.is_null() {
                    // SAFETY: res came from getaddrinfo.
                    unsafe { libc::freeaddrinfo(res) };
                }
                black_box(rc);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_numeric_resolution);
criterion_main!(benches);
