//! Portable serialization in the standard roaring format.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! no run containers:   u32 cookie 12346 | u32 count
//! with run containers: u32 (12347 | (count - 1) << 16) | run bitset, (count + 7) / 8 bytes
//! descriptive header:  count x (u16 key, u16 cardinality - 1)
//! offset header:       count x u32, absent when runs are present and count < 4
//! payloads:            array  -> cardinality x u16
//!                      bitmap -> 1024 x u64
//!                      run    -> u16 run count, then run count x (u16 start, u16 length - 1)
//! ```
//!
//! A non-run payload is an array when the cardinality is at most
//! [`ArrayContainer::MAX_LEN`] and a bitmap otherwise, whatever the in-memory
//! encoding of the container is.
//!
//! Decoding is structural only: the parts are taken as written, so a bitmap read
//! from untrusted bytes should go through [`RoaringBitmap::validate`] (or be read
//! with [`RoaringBitmap::deserialize_validated`]) before it is used.

use std::io::{self, Read, Write};

use byteorder::{LE, ReadBytesExt, WriteBytesExt};

use crate::{
    ContainerKind, RoaringBitmap,
    container::{
        Container, array::ArrayContainer, bitmap::BitmapContainer, run::Run, run::RunContainer,
    },
    error::{Error, Result},
};

/// Cookie of a bitmap without run containers; followed by a `u32` container count.
pub const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;

/// Low 16 bits of the cookie of a bitmap with run containers.
pub const SERIAL_COOKIE: u16 = 12347;

/// With run containers present, the offset header is written only for at least
/// this many containers.
pub const NO_OFFSET_THRESHOLD: usize = 4;

const MAX_CONTAINERS: usize = 1 << 16;

/// Size of everything that precedes the first payload.
fn header_size(count: usize, has_runs: bool) -> usize {
    if has_runs {
        let offsets = if count >= NO_OFFSET_THRESHOLD {
            4 * count
        } else {
            0
        };
        4 + count.div_ceil(8) + 4 * count + offsets
    } else {
        8 + 8 * count
    }
}

fn payload_size(container: &Container) -> usize {
    match container {
        Container::Run(c) => c.serialized_size(),
        c => payload_size_as(c, c.kind()),
    }
}

/// Payload size `container` would have once re-encoded as `kind`.
fn payload_size_as(container: &Container, kind: ContainerKind) -> usize {
    match kind {
        ContainerKind::Run => RunContainer::serialized_size_for(container.count_runs()),
        _ if container.cardinality() <= ArrayContainer::MAX_LEN => {
            ArrayContainer::serialized_size_for(container.cardinality())
        }
        _ => BitmapContainer::SERIALIZED_SIZE,
    }
}

impl RoaringBitmap {
    /// Exact number of bytes written by [`RoaringBitmap::serialize_into`].
    pub fn serialized_size(&self) -> usize {
        header_size(self.container_count(), self.has_run_containers())
            + self.containers().iter().map(payload_size).sum::<usize>()
    }

    /// Serialized size after re-encoding container `i` as `kinds[i]`.
    pub(crate) fn serialized_size_as(&self, kinds: &[ContainerKind]) -> usize {
        debug_assert_eq!(kinds.len(), self.container_count());
        let has_runs = kinds.contains(&ContainerKind::Run);
        header_size(self.container_count(), has_runs)
            + self
                .containers()
                .iter()
                .zip(kinds)
                .map(|(c, &kind)| match (c, kind) {
                    (Container::Run(run), ContainerKind::Run) => run.serialized_size(),
                    _ => payload_size_as(c, kind),
                })
                .sum::<usize>()
    }

    /// Writes the bitmap to `w` and returns the number of bytes written.
    pub fn serialize_into<W>(&self, w: &mut W) -> io::Result<usize>
    where
        W: Write + ?Sized,
    {
        let count = self.container_count();
        let has_runs = self.has_run_containers();

        if has_runs {
            w.write_u32::<LE>(SERIAL_COOKIE as u32 | (((count - 1) as u32) << 16))?;
            let mut run_bitset = vec![0u8; count.div_ceil(8)];
            for (i, container) in self.containers().iter().enumerate() {
                if matches!(container, Container::Run(_)) {
                    run_bitset[i / 8] |= 1 << (i % 8);
                }
            }
            w.write_all(&run_bitset)?;
        } else {
            w.write_u32::<LE>(SERIAL_COOKIE_NO_RUNCONTAINER)?;
            w.write_u32::<LE>(count as u32)?;
        }

        for (&key, container) in self.keys().iter().zip(self.containers()) {
            w.write_u16::<LE>(key)?;
            w.write_u16::<LE>(container.cardinality().wrapping_sub(1) as u16)?;
        }

        let header = header_size(count, has_runs);
        if !has_runs || count >= NO_OFFSET_THRESHOLD {
            let mut offset = header;
            for container in self.containers() {
                w.write_u32::<LE>(offset as u32)?;
                offset += payload_size(container);
            }
        }

        let mut written = header;
        for container in self.containers() {
            written += write_payload(w, container)?;
        }
        Ok(written)
    }

    /// Serializes the bitmap into a new byte vector.
    pub fn serialize_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        self.serialize_into(&mut buf)
            .expect("Writing to a vec should not fail");
        buf
    }

    /// Reads a bitmap written in the standard roaring format.
    ///
    /// Fails on an unknown cookie, on more than 65536 containers and on truncated
    /// input. The result is not validated.
    pub fn deserialize_from<R>(r: &mut R) -> Result<RoaringBitmap>
    where
        R: Read + ?Sized,
    {
        read_bitmap(r).inspect_err(|e| log::debug!("rejected serialized roaring bitmap: {e}"))
    }

    pub fn deserialize_from_slice(bytes: &[u8]) -> Result<RoaringBitmap> {
        let mut cursor = bytes;
        RoaringBitmap::deserialize_from(&mut cursor)
    }

    /// Reads a bitmap and rejects it unless it passes [`RoaringBitmap::validate`].
    pub fn deserialize_validated(bytes: &[u8]) -> Result<RoaringBitmap> {
        let bitmap = RoaringBitmap::deserialize_from_slice(bytes)?;
        let result = bitmap.validate();
        if result.is_valid() {
            Ok(bitmap)
        } else {
            Err(Error::invalid_format("bitmap", result.to_string()))
        }
    }
}

fn write_payload<W>(w: &mut W, container: &Container) -> io::Result<usize>
where
    W: Write + ?Sized,
{
    match container {
        Container::Run(c) => {
            w.write_u16::<LE>(c.count_runs() as u16)?;
            for run in c.runs() {
                w.write_u16::<LE>(run.start)?;
                w.write_u16::<LE>(run.length)?;
            }
            Ok(c.serialized_size())
        }
        Container::Array(c) if c.len() <= ArrayContainer::MAX_LEN => {
            write_u16s(w, c.values())?;
            Ok(c.serialized_size())
        }
        Container::Bitmap(c) if c.cardinality() > ArrayContainer::MAX_LEN => {
            write_u64s(w, &c.words()[..])?;
            Ok(BitmapContainer::SERIALIZED_SIZE)
        }
        Container::Bitmap(c) => {
            for value in c.iter() {
                w.write_u16::<LE>(value)?;
            }
            Ok(ArrayContainer::serialized_size_for(c.cardinality()))
        }
        Container::Array(c) => {
            write_u64s(w, &c.to_bitmap().words()[..])?;
            Ok(BitmapContainer::SERIALIZED_SIZE)
        }
    }
}

fn write_u16s<W>(w: &mut W, values: &[u16]) -> io::Result<()>
where
    W: Write + ?Sized,
{
    if cfg!(target_endian = "little") {
        w.write_all(bytemuck::cast_slice(values))
    } else {
        values.iter().try_for_each(|&v| w.write_u16::<LE>(v))
    }
}

fn write_u64s<W>(w: &mut W, words: &[u64]) -> io::Result<()>
where
    W: Write + ?Sized,
{
    if cfg!(target_endian = "little") {
        w.write_all(bytemuck::cast_slice(words))
    } else {
        words.iter().try_for_each(|&v| w.write_u64::<LE>(v))
    }
}

fn read_bitmap<R>(r: &mut R) -> Result<RoaringBitmap>
where
    R: Read + ?Sized,
{
    let cookie = r
        .read_u32::<LE>()
        .map_err(|e| Error::io("cookie", e))?;

    let (count, run_bitset) = if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
        let count = r
            .read_u32::<LE>()
            .map_err(|e| Error::io("container count", e))? as usize;
        if count > MAX_CONTAINERS {
            return Err(Error::invalid_container_count(count as u64));
        }
        (count, None)
    } else if cookie & 0xFFFF == SERIAL_COOKIE as u32 {
        let count = (cookie >> 16) as usize + 1;
        let mut run_bitset = vec![0u8; count.div_ceil(8)];
        r.read_exact(&mut run_bitset)
            .map_err(|e| Error::io("run bitset", e))?;
        (count, Some(run_bitset))
    } else {
        return Err(Error::invalid_cookie(cookie));
    };

    let mut keys = Vec::with_capacity(count);
    let mut cardinalities = Vec::with_capacity(count);
    for _ in 0..count {
        let key = r
            .read_u16::<LE>()
            .map_err(|e| Error::io("descriptive header", e))?;
        let cardinality = r
            .read_u16::<LE>()
            .map_err(|e| Error::io("descriptive header", e))? as usize
            + 1;
        keys.push(key);
        cardinalities.push(cardinality);
    }

    // Payloads are contiguous, so the offsets carry no extra information for a
    // sequential reader.
    if run_bitset.is_none() || count >= NO_OFFSET_THRESHOLD {
        for _ in 0..count {
            r.read_u32::<LE>()
                .map_err(|e| Error::io("offset header", e))?;
        }
    }

    let is_run = |i: usize| {
        run_bitset
            .as_ref()
            .is_some_and(|bits| bits[i / 8] & (1 << (i % 8)) != 0)
    };

    let mut containers = Vec::with_capacity(count);
    for (i, &cardinality) in cardinalities.iter().enumerate() {
        let container = if is_run(i) {
            let run_count = r
                .read_u16::<LE>()
                .map_err(|e| Error::io("run container", e))? as usize;
            let mut raw = vec![0u16; 2 * run_count];
            r.read_u16_into::<LE>(&mut raw)
                .map_err(|e| Error::io("run container", e))?;
            let runs = raw
                .chunks_exact(2)
                .map(|pair| Run::new(pair[0], pair[1]))
                .collect();
            Container::Run(RunContainer::from_raw_runs(runs))
        } else if cardinality > ArrayContainer::MAX_LEN {
            let mut words = Box::new([0u64; BitmapContainer::WORDS]);
            r.read_u64_into::<LE>(&mut words[..])
                .map_err(|e| Error::io("bitmap container", e))?;
            Container::Bitmap(BitmapContainer::from_raw_parts(words, cardinality))
        } else {
            let mut values = vec![0u16; cardinality];
            r.read_u16_into::<LE>(&mut values)
                .map_err(|e| Error::io("array container", e))?;
            Container::Array(ArrayContainer::from_raw_values(values))
        };
        containers.push(container);
    }

    Ok(RoaringBitmap::from_parts_unchecked(keys, containers))
}
