// Copyright (c) 2025  Energy aware production data authors

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

/*!
Redondeo decimal
================

Every rounded value of an instance record goes through `round_to`.

The rounding rule is round half to even applied to the exact binary value of the number:
the value is printed with the requested number of decimals (which is exact decimal
rounding in `core::fmt`, ties to even) and read back. `2.675` is stored as
`2.67499999...` and thus rounds to `2.67`, while `0.125` is an exact tie and rounds
to `0.12`.
*/

/// Round `value` to `digits` decimal places (half to even on the exact binary value)
pub fn round_to(value: f64, digits: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", digits, value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rounds_to_requested_digits() {
        assert_eq!(round_to(1.0 / 3.0, 3), 0.333);
        assert_eq!(round_to(2.0 / 3.0, 2), 0.67);
        assert_eq!(round_to(1.21, 2), 1.21);
        assert_eq!(round_to(12.0, 3), 12.0);
    }

    #[test]
    fn binary_representation_decides_near_ties() {
        // 2.675 is slightly below the tie in binary
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(1.1 * 1.1, 2), 1.21);
    }

    #[test]
    fn non_finite_values_are_kept() {
        assert!(round_to(std::f64::NAN, 2).is_nan());
        assert_eq!(round_to(std::f64::INFINITY, 2), std::f64::INFINITY);
    }
}
