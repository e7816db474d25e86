//! Response byte transform stages
//!
//! Transforms sit in two stacks on the response writer: body transforms
//! between the caller's writes and the transfer framing, raw transforms
//! between the framing and the socket. The last transform pushed is the
//! outermost; data flows newest to oldest.

use crate::error::Result;

/// A stage that mutates or observes body bytes
pub trait BodyTransform: Send {
    /// Process one chunk; the return value flows downstream. May return
    /// nothing while the stage accumulates.
    fn transform(&mut self, chunk: &[u8]) -> Result<Vec<u8>>;

    /// Flush pending output at end of body.
    fn finish(&mut self) -> Result<Vec<u8>>;
}

/// Run `chunk` through a transform stack, newest stage first.
pub(crate) fn apply(stack: &mut [Box<dyn BodyTransform>], chunk: &[u8]) -> Result<Vec<u8>> {
    let mut data = chunk.to_vec();
    for stage in stack.iter_mut().rev() {
        data = stage.transform(&data)?;
        if data.is_empty() {
            return Ok(data);
        }
    }
    Ok(data)
}

/// Finish every stage newest-first, flushing each stage's tail through
/// the stages beneath it. Returns the concatenated downstream output.
pub(crate) fn finish_all(stack: &mut [Box<dyn BodyTransform>]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for i in (0..stack.len()).rev() {
        let mut data = stack[i].finish()?;
        for j in (0..i).rev() {
            if data.is_empty() {
                break;
            }
            data = stack[j].transform(&data)?;
        }
        out.extend_from_slice(&data);
    }
    Ok(out)
}
