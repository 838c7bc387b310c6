//! Composable checks over decoded token data.
//!
//! Header checkers ([`crate::checker`]) and claim checkers (`jose-claims`) both implement
//! [`Validate`], so they combine with [`Validate::and_then`] and can be stored in
//! collections or behind pointers.

use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use crate::JoseError;

pub trait Validate {
    /// The data being checked.
    type Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError>;

    /// Run `other` after this check succeeds.
    fn and_then<V>(self, other: V) -> impl Validate<Claims = Self::Claims>
    where
        Self: Sized,
        V: Validate<Claims = Self::Claims>,
    {
        AndThen(self, other)
    }

    /// Check a projection of some larger value.
    fn map<T>(self, f: impl for<'a> Fn(&'a T) -> &'a Self::Claims) -> impl Validate<Claims = T>
    where
        Self: Sized,
    {
        Project {
            inner: self,
            f,
            _outer: PhantomData::<fn(&T)>,
        }
    }
}

/// Accepts anything. Only for data that is checked elsewhere.
pub struct NoValidation<Claims>(PhantomData<fn(&Claims)>);

impl<Claims> NoValidation<Claims> {
    pub fn dangerous_no_validation() -> Self {
        NoValidation(PhantomData)
    }
}

impl<Claims> Validate for NoValidation<Claims> {
    type Claims = Claims;

    fn validate(&self, _: &Claims) -> Result<(), JoseError> {
        Ok(())
    }
}

struct AndThen<A, B>(A, B);

impl<A: Validate, B: Validate<Claims = A::Claims>> Validate for AndThen<A, B> {
    type Claims = A::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        self.0.validate(claims).and_then(|()| self.1.validate(claims))
    }
}

struct Project<V, F, T> {
    inner: V,
    f: F,
    _outer: PhantomData<fn(&T)>,
}

impl<V, F, T> Validate for Project<V, F, T>
where
    V: Validate,
    F: for<'a> Fn(&'a T) -> &'a V::Claims,
{
    type Claims = T;

    fn validate(&self, claims: &T) -> Result<(), JoseError> {
        self.inner.validate((self.f)(claims))
    }
}

impl<V: Validate> Validate for [V] {
    type Claims = V::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        self.iter().try_for_each(|v| v.validate(claims))
    }
}

impl<V: Validate> Validate for Vec<V> {
    type Claims = V::Claims;

    fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
        self.as_slice().validate(claims)
    }
}

macro_rules! validate_through_pointer {
    ($($ptr:ident),*) => {$(
        impl<V: Validate + ?Sized> Validate for $ptr<V> {
            type Claims = V::Claims;

            fn validate(&self, claims: &Self::Claims) -> Result<(), JoseError> {
                (**self).validate(claims)
            }
        }
    )*};
}

validate_through_pointer!(Box, Arc, Rc);

#[cfg(test)]
mod tests {
    use super::*;

    struct AtLeast(u32);

    impl Validate for AtLeast {
        type Claims = u32;

        fn validate(&self, claims: &u32) -> Result<(), JoseError> {
            if *claims >= self.0 {
                Ok(())
            } else {
                Err(JoseError::ClaimsError(format!("{claims} < {}", self.0)))
            }
        }
    }

    #[test]
    fn combinators() {
        let v = AtLeast(2).and_then(AtLeast(3));
        v.validate(&3).unwrap();
        v.validate(&2).unwrap_err();

        let projected = AtLeast(5).map(|t: &(u32, &str)| &t.0);
        projected.validate(&(5, "x")).unwrap();
        projected.validate(&(4, "x")).unwrap_err();

        let boxed: Vec<Box<dyn Validate<Claims = u32>>> =
            vec![Box::new(AtLeast(1)), Box::new(AtLeast(10))];
        boxed.validate(&10).unwrap();
        boxed.validate(&9).unwrap_err();

        NoValidation::<u32>::dangerous_no_validation()
            .validate(&0)
            .unwrap();
    }
}
