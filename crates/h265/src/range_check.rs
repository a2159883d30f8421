/// Checks that an unsigned syntax element lies inside its allowed interval and
/// returns an `InvalidData` error naming the element otherwise.
macro_rules! range_check {
    ($n:expr,0, $upper:expr) => {{
        trait Unsigned {}
        impl Unsigned for u8 {}
        impl Unsigned for u16 {}
        impl Unsigned for u32 {}
        impl Unsigned for u64 {}
        impl Unsigned for usize {}

        #[inline(always)]
        const fn unsigned_type_check<N: Unsigned>(_: &N) {}
        unsigned_type_check(&$n);

        if $n > $upper {
            ::std::result::Result::Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!("{} is out of range [0, {}]: {}", stringify!($n), $upper, $n),
            ))
        } else {
            ::std::result::Result::Ok(())
        }
    }};
    ($n:expr, $lower:expr, $upper:expr) => {{
        if $n < $lower || $n > $upper {
            ::std::result::Result::Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!("{} is out of range [{}, {}]: {}", stringify!($n), $lower, $upper, $n),
            ))
        } else {
            ::std::result::Result::Ok(())
        }
    }};
}

pub(crate) use range_check;

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    #[test]
    fn in_range() {
        let chroma_format_idc = 3u8;
        range_check!(chroma_format_idc, 0, 3).unwrap();
    }

    #[test]
    fn out_of_range() {
        let sps_max_sub_layers_minus1 = 7u8;
        let err = range_check!(sps_max_sub_layers_minus1, 0, 6).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
