/// Calls a function with its arguments packed in a tuple.
///
/// This is what lets [`run!`](crate::run!) take a callable followed by its
/// arguments: the arguments are evaluated on the submitting thread, packed,
/// moved to the worker, and unpacked there.
pub trait Invoke<Args> {
    type Output;

    fn invoke(self, args: Args) -> Self::Output;
}

macro_rules! impl_invoke {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg),*> Invoke<($($arg,)*)> for Func
        where
            Func: FnOnce($($arg),*) -> Ret,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn invoke(self, args: ($($arg,)*)) -> Self::Output {
                let ($($arg,)*) = args;
                self($($arg),*)
            }
        }
    };
}

impl_invoke!();
impl_invoke!(A);
impl_invoke!(A, B);
impl_invoke!(A, B, C);
impl_invoke!(A, B, C, D);
impl_invoke!(A, B, C, D, E);
impl_invoke!(A, B, C, D, E, F);
impl_invoke!(A, B, C, D, E, F, G);
impl_invoke!(A, B, C, D, E, F, G, H);
