/*******************************************************************************
*   (c) 2021 Zondax GmbH
*
*  Licensed under the Apache License, Version 2.0 (the "License");
*  you may not use this file except in compliance with the License.
*  You may obtain a copy of the License at
*
*      http://www.apache.org/licenses/LICENSE-2.0
*
*  Unless required by applicable law or agreed to in writing, software
*  distributed under the License is distributed on an "AS IS" BASIS,
*  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
*  See the License for the specific language governing permissions and
*  limitations under the License.
********************************************************************************/
use arrayvec::CapacityError;
use nom::error::ErrorKind;

#[repr(u32)]
#[derive(Copy, Clone, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "fuzzing"), derive(Debug))]
pub enum ParserError {
    // Generic errors
    NoData,
    InitContextEmpty,
    DisplayIdxOutOfRange,
    DisplayPageOutOfRange,
    UnexpectedError,
    // Input
    UnexpectedBufferEnd,
    UnexpectedCharacters,
    UnexpectedValue,
    ValueOutOfRange,
    UnexpectedUnparsedBytes,
    ExpertModeRequired,
    TxObjEmpty,
    InvalidTxType,
    // Json
    JsonTooManyTokens,
    JsonIncomplete,
    JsonZeroTokens,
    JsonTooDeep,
    // Items
    TooManyItems,
    DataLengthZero,
    DataTooLarge,
}

impl ParserError {
    /// Short message shown to the user when a request is refused
    pub const fn description(self) -> &'static str {
        match self {
            Self::NoData => "No more data",
            Self::InitContextEmpty => "Initialized empty context",
            Self::DisplayIdxOutOfRange => "display index out of range",
            Self::DisplayPageOutOfRange => "display page out of range",
            Self::UnexpectedError => "Unexpected error",
            Self::UnexpectedBufferEnd => "Unexpected buffer end",
            Self::UnexpectedCharacters => "Unexpected characters",
            Self::UnexpectedValue => "Unexpected value",
            Self::ValueOutOfRange => "Value out of range",
            Self::UnexpectedUnparsedBytes => "Unexpected unparsed bytes",
            Self::ExpertModeRequired => "Expert mode required for this operation",
            Self::TxObjEmpty => "Transaction object empty",
            Self::InvalidTxType => "Invalid transaction type",
            Self::JsonTooManyTokens => "JSON: Too many tokens",
            Self::JsonIncomplete => "JSON: Incomplete JSON",
            Self::JsonZeroTokens => "JSON: Zero tokens",
            Self::JsonTooDeep => "JSON: Nesting too deep",
            Self::TooManyItems => "Too many items",
            Self::DataLengthZero => "Data length zero",
            Self::DataTooLarge => "Data too large",
        }
    }
}

impl From<ErrorKind> for ParserError {
    fn from(err: ErrorKind) -> Self {
        match err {
            ErrorKind::Eof => ParserError::UnexpectedBufferEnd,
            ErrorKind::TooLarge => ParserError::ValueOutOfRange,
            ErrorKind::Tag => ParserError::InvalidTxType,
            _ => ParserError::UnexpectedError,
        }
    }
}

impl<I> nom::error::ParseError<I> for ParserError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        Self::from(kind)
    }

    // We don't have enough memory resources to use here an array with the last
    // N errors to be used as a backtrace, so that, we just propagate here the latest
    // reported error
    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl From<ParserError> for nom::Err<ParserError> {
    fn from(error: ParserError) -> Self {
        nom::Err::Error(error)
    }
}

impl<T> From<CapacityError<T>> for ParserError {
    fn from(_: CapacityError<T>) -> Self {
        ParserError::TooManyItems
    }
}

impl From<nom::Err<Self>> for ParserError {
    fn from(e: nom::Err<Self>) -> Self {
        match e {
            nom::Err::Error(e) => e,
            nom::Err::Failure(e) => e,
            nom::Err::Incomplete(_) => Self::UnexpectedBufferEnd,
        }
    }
}
