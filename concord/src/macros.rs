/// Runs a callable with arguments on a thread pool.
///
/// The arguments are evaluated on the calling thread and moved to the
/// worker. Prefix the call with `pool = <Option<&ThreadPool>>;` to pick
/// the pool; otherwise the default pool is used.
///
/// # Examples
///
/// ```rust
/// use concord::ThreadPool;
///
/// fn area(width: u32, height: u32) -> u32 {
///     width * height
/// }
///
/// let pool = ThreadPool::new(1);
///
/// let a = concord::run!(area, 3, 4);
/// let b = concord::run!(pool = Some(&pool); area, 5, 6);
///
/// assert_eq!(a.result().unwrap(), 12);
/// assert_eq!(b.result().unwrap(), 30);
/// ```
#[macro_export]
macro_rules! run {
    (pool = $pool:expr; $f:expr $(, $arg:expr)* $(,)?) => {{
        let f = $f;
        let args = ($($arg,)*);

        $crate::run_on($pool, move || $crate::task::Invoke::invoke(f, args))
    }};

    ($f:expr $(, $arg:expr)* $(,)?) => {{
        let f = $f;
        let args = ($($arg,)*);

        $crate::run(move || $crate::task::Invoke::invoke(f, args))
    }};
}
