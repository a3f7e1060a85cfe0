use crossbeam_channel::{bounded, Receiver, Sender};
use std::{
	fmt::{self, Debug, Formatter},
	mem::ManuallyDrop,
	ops::{Deref, DerefMut},
};

/// A bounded pool of reusable values.
///
/// Idle values sit in a lock-free array queue. Taking from an empty pool constructs a new value
/// and returning to a full pool drops it, so neither side ever waits.
pub struct Pool<T> {
	constructor: Box<dyn Fn() -> T + Send + Sync>,
	sender: Sender<T>,
	receiver: Receiver<T>,
}

impl<T> Pool<T> {
	pub fn new<F>(size: usize, constructor: F) -> Self
	where
		F: Fn() -> T + Send + Sync + 'static,
	{
		let (sender, receiver) = bounded(size.max(1));
		Self {
			constructor: Box::new(constructor),
			sender,
			receiver,
		}
	}

	pub fn take(&self) -> Recyclable<'_, T> {
		let data = self.receiver.try_recv().unwrap_or_else(|_| (self.constructor)());
		Recyclable {
			parent: self,
			data: ManuallyDrop::new(data),
		}
	}

	/// Number of idle values currently held.
	pub fn idle(&self) -> usize {
		self.receiver.len()
	}

	pub fn capacity(&self) -> usize {
		self.sender.capacity().unwrap_or(0)
	}
}

impl<T> Default for Pool<T>
where
	T: Default + 'static,
{
	fn default() -> Self {
		Self::new(10, T::default)
	}
}

impl<T> Debug for Pool<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Pool")
			.field("idle", &self.idle())
			.field("capacity", &self.capacity())
			.finish()
	}
}

/// A value on loan from a [`Pool`]; it goes back to the pool when dropped.
pub struct Recyclable<'a, T> {
	parent: &'a Pool<T>,
	data: ManuallyDrop<T>,
}

impl<'a, T> Deref for Recyclable<'a, T> {
	type Target = T;

	fn deref(&self) -> &Self::Target {
		&self.data
	}
}

impl<'a, T> DerefMut for Recyclable<'a, T> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.data
	}
}

impl<'a, T> Drop for Recyclable<'a, T> {
	fn drop(&mut self) {
		// SAFETY: `data` is never touched again after this.
		let data = unsafe { ManuallyDrop::take(&mut self.data) };
		let _ = self.parent.sender.try_send(data);
	}
}
