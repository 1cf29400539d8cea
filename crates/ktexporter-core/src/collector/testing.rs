//! Throwaway HTTP server standing in for a Kyoto Tycoon instance in tests.

use std::net::SocketAddr;

use axum::Router;
use axum::routing::get;

use super::fetcher::REPORT_PATH;

/// Reference report captured from a single-database server.
pub(crate) const SAMPLE_REPORT: &str = "cnt_get\t1
cnt_get_misses\t0
cnt_misc\t0
cnt_remove\t0
cnt_remove_misses\t0
cnt_script\t0
cnt_set\t1
cnt_set_misses\t0
conf_kc_features\t(atomic)(zlib)
conf_kc_version\t1.2.76 (16.13)
conf_kt_features\t(epoll)(lua)
conf_kt_version\t0.9.56 (2.19)
conf_os_name\tLinux
db_0\tcount=1 size=8388691 path=:
db_total_count\t1
db_total_size\t8388691
serv_conn_count\t1
serv_current_time\t1505531246.924222
serv_proc_id\t1
serv_running_term\t120.520679
serv_task_count\t0
serv_thread_count\t16
sys_mem_cached\t1586905088
sys_mem_free\t185495552
sys_mem_peak\t27377664
sys_mem_rss\t2883584
sys_mem_size\t27377664
sys_mem_total\t2096164864
sys_ru_stime\t0.200000
sys_ru_utime\t1.260000
";

/// Binds an ephemeral port on localhost and serves `router` in the background.
pub(crate) async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Serves a fixed report body on the report path.
pub(crate) async fn serve_report(report: &'static str) -> SocketAddr {
    serve(Router::new().route(REPORT_PATH, get(move || async move { report }))).await
}
