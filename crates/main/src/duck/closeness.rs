////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
};

use strsim::normalized_damerau_levenshtein;

const PRECISION: f32 = 0.0001;

/// A similarity score of two member names, used to suggest a replacement
/// for a member name that does not resolve.
///
/// The score is a percentage: "100%" means the names are identical, "0%"
/// means they share nothing. The comparison is case-sensitive, so names that
/// differ only in case score below "100%".
///
/// The Debug and Display implementations round the percentage to the
/// nearest integer.
#[repr(transparent)]
#[derive(Clone, Copy, Default)]
pub struct Closeness(f32);

impl Debug for Closeness {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, formatter)
    }
}

impl Display for Closeness {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!("{}%", self.percents()))
    }
}

impl PartialEq for Closeness {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.quantized() == other.quantized()
    }
}

impl Eq for Closeness {}

impl PartialOrd for Closeness {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Closeness {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.quantized().cmp(&other.quantized())
    }
}

impl Closeness {
    /// Measures how close the `candidate` name is to the `pattern` name.
    ///
    /// ```
    /// use tracer_duck::duck::Closeness;
    ///
    /// assert_eq!(Closeness::of("Timeout", "Timeout"), Closeness::one());
    /// assert!(Closeness::of("Timeout", "TimeOut") >= Closeness::half());
    /// assert!(Closeness::of("Timeout", "Connection") < Closeness::half());
    /// ```
    pub fn of(pattern: &str, candidate: &str) -> Self {
        let score = normalized_damerau_levenshtein(pattern, candidate) as f32;

        Self((score / PRECISION).round() * PRECISION)
    }

    /// The "0%" score.
    #[inline(always)]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    /// The "50%" score. Names below this score are never suggested.
    #[inline(always)]
    pub const fn half() -> Self {
        Self(0.5)
    }

    /// The "100%" score.
    #[inline(always)]
    pub const fn one() -> Self {
        Self(1.0)
    }

    /// Returns the percentage rounded to the nearest integer.
    #[inline(always)]
    pub fn percents(self) -> u16 {
        (self.0 * 100.0).round() as u16
    }

    #[inline(always)]
    fn quantized(self) -> u32 {
        (self.0 / PRECISION).round() as u32
    }
}

/// Picks the candidate name closest to the `pattern`, provided it scores at
/// least [half](Closeness::half). The first of equally close candidates wins.
pub(crate) fn closest<'a>(
    pattern: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let mut best: Option<(Closeness, &'a str)> = None;

    for candidate in candidates {
        let closeness = Closeness::of(pattern, candidate);

        if closeness < Closeness::half() {
            continue;
        }

        match &best {
            Some((score, _)) if *score >= closeness => (),
            _ => best = Some((closeness, candidate)),
        }
    }

    best.map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use crate::duck::closeness::{closest, Closeness};

    #[test]
    fn test_closeness_scores() {
        assert_eq!(Closeness::of("id", "id"), Closeness::one());
        assert_eq!(Closeness::of("abc", "xyz"), Closeness::zero());
        assert_eq!(Closeness::one().to_string(), "100%");
    }

    #[test]
    fn test_closest_candidate() {
        let candidates = ["CommandTimeout", "CommandText", "Connection"];

        assert_eq!(closest("CommandTxt", candidates), Some("CommandText"));
        assert_eq!(closest("Transaction", ["Id", "Name"]), None);
        assert_eq!(closest("x", std::iter::empty::<&str>()), None);
    }
}
