//! Conversions between [`ethabi::Token`]s and the domain types returned by contract calls.

use crate::{ethabi::Token, Address, H256, U256};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid output type: {0}")]
    InvalidOutputType(String),
    #[error("{0}")]
    Other(String),
}

/// Output of a contract call that can be built from the decoded return tokens.
pub trait Detokenize: Sized {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, Error>;
}

impl<T: Tokenizable> Detokenize for T {
    fn from_tokens(tokens: Vec<Token>) -> Result<Self, Error> {
        let [token] = <[Token; 1]>::try_from(tokens).map_err(|tokens| {
            Error::InvalidOutputType(format!("expected array with 1 token, got {tokens:?}"))
        })?;
        Self::from_token(token)
    }
}

macro_rules! impl_detokenize_for_tuple {
    ($len:literal; $($ty:ident),+) => {
        impl<$($ty,)+> Detokenize for ($($ty,)+)
        where
            $($ty: Tokenizable,)+
        {
            fn from_tokens(tokens: Vec<Token>) -> Result<Self, Error> {
                if tokens.len() != $len {
                    return Err(Error::InvalidOutputType(format!(
                        "expected {} tokens, got {tokens:?}",
                        $len
                    )));
                }
                let mut tokens = tokens.into_iter();
                Ok(($(
                    $ty::from_token(tokens.next().ok_or_else(|| {
                        Error::Other("token stream ended early".to_owned())
                    })?)?,
                )+))
            }
        }
    };
}

impl_detokenize_for_tuple!(2; A, B);
impl_detokenize_for_tuple!(3; A, B, C);
impl_detokenize_for_tuple!(4; A, B, C, D);
impl_detokenize_for_tuple!(5; A, B, C, D, E);
impl_detokenize_for_tuple!(6; A, B, C, D, E, F);
impl_detokenize_for_tuple!(7; A, B, C, D, E, F, G);

/// Arguments of a contract call.
pub trait Tokenize {
    fn into_tokens(self) -> Vec<Token>;
}

impl<T: Tokenizable> Tokenize for T {
    fn into_tokens(self) -> Vec<Token> {
        vec![self.into_token()]
    }
}

impl Tokenize for () {
    fn into_tokens(self) -> Vec<Token> {
        vec![]
    }
}

macro_rules! impl_tokenize_for_tuple {
    ($($idx:tt : $ty:ident),+) => {
        impl<$($ty,)+> Tokenize for ($($ty,)+)
        where
            $($ty: Tokenizable,)+
        {
            fn into_tokens(self) -> Vec<Token> {
                vec![$(self.$idx.into_token(),)+]
            }
        }
    };
}

impl_tokenize_for_tuple!(0: A, 1: B);
impl_tokenize_for_tuple!(0: A, 1: B, 2: C);
impl_tokenize_for_tuple!(0: A, 1: B, 2: C, 3: D);

pub trait Tokenizable: Sized {
    fn from_token(token: Token) -> Result<Self, Error>;
    fn into_token(self) -> Token;
}

impl Tokenizable for bool {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::Bool(flag) => Ok(flag),
            _ => Err(Error::InvalidOutputType(format!(
                "expected bool, got {token:?}"
            ))),
        }
    }

    fn into_token(self) -> Token {
        Token::Bool(self)
    }
}

impl Tokenizable for Address {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::Address(address) => Ok(address),
            _ => Err(Error::InvalidOutputType(format!(
                "expected address, got {token:?}"
            ))),
        }
    }

    fn into_token(self) -> Token {
        Token::Address(self)
    }
}

impl Tokenizable for U256 {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::Uint(value) => Ok(value),
            _ => Err(Error::InvalidOutputType(format!(
                "expected uint256, got {token:?}"
            ))),
        }
    }

    fn into_token(self) -> Token {
        Token::Uint(self)
    }
}

impl Tokenizable for u64 {
    fn from_token(token: Token) -> Result<Self, Error> {
        let value = U256::from_token(token)?;
        if value > U256::from(u64::MAX) {
            return Err(Error::InvalidOutputType(format!(
                "value {value} does not fit into u64"
            )));
        }
        Ok(value.as_u64())
    }

    fn into_token(self) -> Token {
        Token::Uint(self.into())
    }
}

impl Tokenizable for H256 {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::FixedBytes(value) => value.as_slice().try_into().map(H256).map_err(|_| {
                Error::InvalidOutputType(format!("expected bytes32, got {value:?}"))
            }),
            _ => Err(Error::InvalidOutputType(format!(
                "expected bytes32, got {token:?}"
            ))),
        }
    }

    fn into_token(self) -> Token {
        Token::FixedBytes(self.as_bytes().to_vec())
    }
}

impl Tokenizable for Vec<u8> {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::Bytes(bytes) => Ok(bytes),
            _ => Err(Error::InvalidOutputType(format!(
                "expected bytes, got {token:?}"
            ))),
        }
    }

    fn into_token(self) -> Token {
        Token::Bytes(self)
    }
}

impl Tokenizable for Token {
    fn from_token(token: Token) -> Result<Self, Error> {
        Ok(token)
    }

    fn into_token(self) -> Token {
        self
    }
}

impl<T: TokenizableItem> Tokenizable for Vec<T> {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::FixedArray(tokens) | Token::Array(tokens) => {
                tokens.into_iter().map(Tokenizable::from_token).collect()
            }
            other => Err(Error::InvalidOutputType(format!(
                "expected array, got {other:?}"
            ))),
        }
    }

    fn into_token(self) -> Token {
        Token::Array(self.into_iter().map(Tokenizable::into_token).collect())
    }
}

/// Marker trait for `Tokenizable` types that can be (de)tokenized as array items.
pub trait TokenizableItem: Tokenizable {}

impl TokenizableItem for Token {}
impl TokenizableItem for Address {}
impl TokenizableItem for U256 {}
impl TokenizableItem for H256 {}
