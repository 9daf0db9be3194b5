use serde::Serialize;

use super::{
    name::{read_name, DEFAULT_MAX_POINTER_HOPS},
    rdata::{RDataRegistry, RDataSlice},
};
use crate::{
    error::DecodeError,
    protocol::{
        header::{Flags, Header, HEADER_LEN},
        question::Question,
        record::{RecordMeta, ResourceRecord},
        record_class::RecordClass,
        record_type::RecordType,
    },
};

/// A cursor over one DNS message.
///
/// The parser always keeps the full message around, since compression pointers are
/// absolute offsets into it, and only moves `position` forward.
#[derive(Debug)]
pub struct DnsParser<'a> {
    pub buf: &'a [u8],
    position: usize,
    max_pointer_hops: usize,
    registry: &'a RDataRegistry,
}

impl<'a> DnsParser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            position: 0,
            max_pointer_hops: DEFAULT_MAX_POINTER_HOPS,
            registry: RDataRegistry::standard(),
        }
    }

    /// Starts parsing at `position` instead of the beginning of the message.
    pub fn at(buf: &'a [u8], position: usize) -> Self {
        Self {
            position,
            ..Self::new(buf)
        }
    }

    pub fn with_max_pointer_hops(mut self, max_pointer_hops: usize) -> Self {
        self.max_pointer_hops = max_pointer_hops;
        self
    }

    pub fn with_registry(mut self, registry: &'a RDataRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn advance(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let out = self
            .buf
            .get(self.position..self.position + n)
            .ok_or(DecodeError::TruncatedMessage)?;
        self.position += n;
        Ok(out)
    }

    fn advance_n<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        self.advance(N)?
            .try_into()
            .map_err(|_| DecodeError::TruncatedMessage)
    }

    fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_be_bytes(self.advance_n::<2>()?))
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.advance_n::<4>()?))
    }

    // Name format https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.4
    fn parse_domain_name(&mut self) -> Result<String, DecodeError> {
        let (name, consumed) = read_name(self.buf, self.position, self.max_pointer_hops)?;
        self.position += consumed;
        Ok(name)
    }

    // Header section format https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.1
    pub fn parse_header(&mut self) -> Result<Header, DecodeError> {
        if self.buf.len() < self.position + HEADER_LEN {
            return Err(DecodeError::TruncatedMessage);
        }
        Ok(Header {
            request_id: self.read_u16()?,
            flags: Flags::from(self.read_u16()?),
            question_count: self.read_u16()?,
            answer_count: self.read_u16()?,
            authority_count: self.read_u16()?,
            additional_count: self.read_u16()?,
        })
    }

    // Question section format https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
    pub fn parse_question(&mut self) -> Result<Question, DecodeError> {
        Ok(Question {
            domain_name: self.parse_domain_name()?,
            r#type: RecordType::from(self.read_u16()?),
            class: RecordClass::from(self.read_u16()?),
        })
    }

    pub fn parse_questions(&mut self, count: u16) -> Result<Vec<Question>, DecodeError> {
        (0..count).map(|_| self.parse_question()).collect()
    }

    // Resource section format https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.3
    pub fn parse_record(&mut self) -> Result<ResourceRecord, DecodeError> {
        let name = self.parse_domain_name()?;
        let record_type = RecordType::from(self.read_u16()?);
        let class = RecordClass::from(self.read_u16()?);
        let ttl = self.read_u32()?;
        let len = self.read_u16()?;

        // Consume exactly RDLENGTH bytes up front, so a payload we cannot decode never
        // shifts the records behind it.
        let rdata_offset = self.position;
        self.advance(usize::from(len))?;
        let rdata = RDataSlice::new(
            record_type,
            self.buf,
            rdata_offset,
            usize::from(len),
            self.max_pointer_hops,
        );

        let meta = RecordMeta {
            name,
            r#type: record_type,
            class,
            ttl,
            len,
        };
        Ok(ResourceRecord::new(meta, self.registry.decode(&rdata)))
    }

    pub fn parse_records(&mut self, count: usize) -> Result<Vec<ResourceRecord>, DecodeError> {
        (0..count).map(|_| self.parse_record()).collect()
    }

    /// Parses the whole message: header, every question and all three record sections.
    pub fn parse(&mut self) -> Result<DnsPacket, DecodeError> {
        self.position = 0;
        let header = self.parse_header()?;
        let questions = self.parse_questions(header.question_count)?;
        let answers = self.parse_records(usize::from(header.answer_count))?;
        let authorities = self.parse_records(usize::from(header.authority_count))?;
        let additionals = self.parse_records(usize::from(header.additional_count))?;

        Ok(DnsPacket {
            header,
            questions,
            answers,
            authorities,
            additionals,
            trailing_bytes: self.buf.len().saturating_sub(self.position),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DnsPacket {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
    /// Bytes left over after the sections the header announced. Anything but zero means
    /// the counts do not describe the message.
    pub trailing_bytes: usize,
}

impl DnsPacket {
    /// Most nameservers only ever answer a single question, see
    /// https://stackoverflow.com/questions/4082081/requesting-a-and-aaaa-records-in-single-dns-query/4083071#4083071.
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
    }
}

/// Decodes the fixed 12 byte header at the start of `buf`.
pub fn decode_header(buf: &[u8]) -> Result<Header, DecodeError> {
    DnsParser::new(buf).parse_header()
}

/// Decodes one question starting at `offset` and returns it with the number of bytes it used.
pub fn decode_question(buf: &[u8], offset: usize) -> Result<(Question, usize), DecodeError> {
    let mut parser = DnsParser::at(buf, offset);
    let question = parser.parse_question()?;
    Ok((question, parser.position() - offset))
}

/// Decodes `count` consecutive resource records starting at `offset`. Returns them in
/// wire order together with the offset right after the last one.
pub fn decode_records(
    buf: &[u8],
    offset: usize,
    count: usize,
) -> Result<(Vec<ResourceRecord>, usize), DecodeError> {
    let mut parser = DnsParser::at(buf, offset);
    let records = parser.parse_records(count)?;
    Ok((records, parser.position()))
}
